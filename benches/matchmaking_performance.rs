//! Performance benchmarks for team allocation and scrim formation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scrim_room::config::AppConfig;
use scrim_room::gateway::{InMemoryPersistence, LoggingChatGateway};
use scrim_room::matchmaking::{assign_roles, Matchmaker};
use scrim_room::types::{Candidate, QueueKey, Rank, Region, Role};
use scrim_room::utils::current_timestamp;
use scrim_room::ScrimManager;
use std::sync::Arc;

fn bench_candidate(id: &str, main_role: Role, secondary_role: Role, rating: i32) -> Candidate {
    Candidate {
        id: id.to_string(),
        display_name: id.to_string(),
        region: Region::Euw,
        rank: Rank::Gold,
        main_role,
        secondary_role,
        rating,
        external_rating: rating,
        wins: 0,
        losses: 0,
        autofill_protected: false,
        registered_at: current_timestamp(),
    }
}

fn two_per_role() -> Vec<Candidate> {
    (0..10)
        .map(|i| {
            bench_candidate(
                &format!("player{}", i),
                Role::ALL[i / 2],
                Role::ALL[(i / 2 + 1) % 5],
                1400 + (i as i32 * 73) % 900,
            )
        })
        .collect()
}

fn no_support_mains() -> Vec<Candidate> {
    (0..10)
        .map(|i| {
            bench_candidate(
                &format!("player{}", i),
                Role::ALL[i % 4],
                Role::Support,
                1400 + (i as i32 * 61) % 900,
            )
        })
        .collect()
}

fn bench_matchmake(c: &mut Criterion) {
    let matchmaker = Matchmaker::default();
    let exact = two_per_role();
    let filled = no_support_mains();

    c.bench_function("matchmake_two_per_role", |b| {
        b.iter(|| black_box(matchmaker.matchmake(black_box(&exact))))
    });

    c.bench_function("matchmake_secondary_fill", |b| {
        b.iter(|| black_box(matchmaker.matchmake(black_box(&filled))))
    });

    let matchup = matchmaker.matchmake(&exact).unwrap();
    c.bench_function("assign_roles", |b| {
        b.iter(|| black_box(assign_roles(black_box(&matchup))))
    });
}

fn bench_scrim_formation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = AppConfig::default();
    let key = QueueKey::new("bench", Region::Euw);

    c.bench_function("queue_and_form_scrim", |b| {
        b.iter(|| {
            rt.block_on(async {
                let manager = ScrimManager::new(
                    &config,
                    Arc::new(InMemoryPersistence::new()),
                    Arc::new(LoggingChatGateway::new(config.gateway.clone())),
                );
                for candidate in two_per_role() {
                    let candidate = manager.register_candidate(candidate).await.unwrap();
                    manager.join_queue(candidate, &key).await.unwrap();
                }
                black_box(manager.attempt_match_creation(&key).await)
            })
        })
    });
}

criterion_group!(benches, bench_matchmake, bench_scrim_formation);
criterion_main!(benches);

//! Integration tests for the scrim-room matchmaking service
//!
//! These tests drive the ScrimManager end to end over in-memory persistence
//! and a recording chat gateway:
//! - Queue membership rules
//! - Scrim formation from the queue front
//! - Result reporting and rating updates
//! - Best-effort chat side effects

mod fixtures;

use scrim_room::config::AppConfig;
use scrim_room::error::MatchmakingError;
use scrim_room::types::{
    MatchCreation, MatchmakingStatus, QueueKey, Region, Role, Scrim, ScrimStatus, Side,
};
use scrim_room::ScrimManager;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fixtures::{
    candidate, no_support_mains, queue_all, test_system, two_per_role, ChatCall,
    FailingChatGateway, RecordingChatGateway,
};

fn euw() -> QueueKey {
    QueueKey::new("guild", Region::Euw)
}

fn na() -> QueueKey {
    QueueKey::new("guild", Region::Na)
}

fn recording_system() -> (
    ScrimManager,
    Arc<scrim_room::gateway::InMemoryPersistence>,
    Arc<RecordingChatGateway>,
) {
    let chat = Arc::new(RecordingChatGateway::new());
    let (manager, persistence) = test_system(&AppConfig::default(), chat.clone());
    (manager, persistence, chat)
}

fn assert_error(err: anyhow::Error, expected: impl Fn(&MatchmakingError) -> bool) {
    match err.downcast_ref::<MatchmakingError>() {
        Some(e) => assert!(expected(e), "unexpected error: {}", e),
        None => panic!("not a matchmaking error: {}", err),
    }
}

async fn form_scrim(manager: &ScrimManager, key: &QueueKey) -> Scrim {
    match manager.attempt_match_creation(key).await.unwrap() {
        MatchCreation::Formed(scrim) => scrim,
        MatchCreation::NotEnoughPlayers => panic!("expected a scrim to be formed"),
    }
}

fn side_ids(scrim: &Scrim, side: Side) -> HashSet<String> {
    scrim
        .players_on(side)
        .iter()
        .map(|p| p.candidate_id.clone())
        .collect()
}

#[tokio::test]
async fn test_queue_membership_rules() {
    let (manager, _persistence, _chat) = recording_system();
    let top = candidate("top", Role::Top, Role::Mid, 1500);

    manager.join_queue(top.clone(), &euw()).await.unwrap();

    let err = manager.join_queue(top.clone(), &euw()).await.unwrap_err();
    assert_error(err, |e| matches!(e, MatchmakingError::AlreadyQueued { .. }));

    // A different region is a different queue
    manager.join_queue(top.clone(), &na()).await.unwrap();

    let members = manager.leave_queue("top", &euw()).await.unwrap();
    assert!(members.is_empty());

    let err = manager.leave_queue("top", &euw()).await.unwrap_err();
    assert_error(err, |e| matches!(e, MatchmakingError::NotQueued { .. }));

    let stats = manager.get_stats().await.unwrap();
    assert_eq!(stats.candidates_queued, 2);
    assert_eq!(stats.joins_rejected, 1);
}

#[tokio::test]
async fn test_not_enough_players() {
    let (manager, _persistence, chat) = recording_system();
    let mut candidates = two_per_role();
    candidates.truncate(9);
    queue_all(&manager, &euw(), candidates).await.unwrap();

    assert_eq!(
        manager.check_readiness(&euw()).await.unwrap(),
        MatchmakingStatus::NotEnoughPlayers
    );
    assert!(matches!(
        manager.attempt_match_creation(&euw()).await.unwrap(),
        MatchCreation::NotEnoughPlayers
    ));
    assert_eq!(manager.queue_members(&euw()).await.unwrap().len(), 9);
    assert!(chat.calls().is_empty());
}

#[tokio::test]
async fn test_complete_scrim_workflow() {
    let (manager, persistence, chat) = recording_system();
    queue_all(&manager, &euw(), two_per_role()).await.unwrap();
    assert_eq!(
        manager.check_readiness(&euw()).await.unwrap(),
        MatchmakingStatus::Ready
    );

    // Step 1: form the scrim
    let scrim = form_scrim(&manager, &euw()).await;
    assert_eq!(scrim.status, ScrimStatus::Started);
    assert_eq!(scrim.rating_difference, 37);
    assert_eq!(scrim.players.len(), 10);

    let unique: HashSet<&str> = scrim.players.iter().map(|p| p.candidate_id.as_str()).collect();
    assert_eq!(unique.len(), 10);
    for side in [Side::Blue, Side::Red] {
        let roles: HashSet<Role> = scrim.players_on(side).iter().map(|p| p.role).collect();
        assert_eq!(roles.len(), 5);
    }

    let expected: HashSet<String> = ["huzzle", "kharann", "tikka", "z", "zero"]
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert!(side_ids(&scrim, Side::Blue) == expected || side_ids(&scrim, Side::Red) == expected);

    // Everyone left the queue and is locked into the match
    assert!(manager.queue_members(&euw()).await.unwrap().is_empty());
    let err = manager
        .join_queue(candidate("huzzle", Role::Top, Role::Mid, 2100), &euw())
        .await
        .unwrap_err();
    assert_error(err, |e| matches!(e, MatchmakingError::AlreadyInMatch { .. }));

    // Step 2: side effects on the chat platform
    assert_eq!(
        chat.count(|c| matches!(c, ChatCall::CreateVoice { .. })),
        1
    );
    let mut messaged = chat.messaged();
    messaged.sort();
    messaged.dedup();
    assert_eq!(messaged.len(), 10);
    assert_eq!(scrim.voice_channel_ids.len(), 2);

    // Step 3: report the winner
    let result = manager.report_winner(scrim.id, "blue").await.unwrap();
    assert_eq!(result.scrim.status, ScrimStatus::Completed);
    assert_eq!(result.scrim.winner, Some(Side::Blue));
    assert_eq!(result.rating_changes.len(), 10);
    assert_eq!(
        result.rating_changes.iter().filter(|c| c.delta == 25).count(),
        5
    );
    assert_eq!(
        result.rating_changes.iter().filter(|c| c.delta == -25).count(),
        5
    );
    assert!(result
        .rating_changes
        .iter()
        .all(|c| (c.side == Side::Blue) == (c.delta > 0)));
    assert_eq!(result.deleted_channels.as_ref().map(Vec::len), Some(2));
    assert_eq!(result.thread_id, Some(format!("thread-{}", scrim.id)));

    for player in scrim.players_on(Side::Blue) {
        let stored = persistence.get_candidate(&player.candidate_id).unwrap().unwrap();
        assert_eq!(stored.wins, 1);
    }
    let stored = persistence.get_scrim(scrim.id).unwrap().unwrap();
    assert_eq!(stored.winner, Some(Side::Blue));

    // Players can queue again
    manager
        .join_queue(candidate("huzzle", Role::Top, Role::Mid, 2100), &euw())
        .await
        .unwrap();

    let stats = manager.get_stats().await.unwrap();
    assert_eq!(stats.scrims_created, 1);
    assert_eq!(stats.scrims_completed, 1);
    assert_eq!(stats.active_scrims, 0);
    assert_eq!(stats.gateway_failures, 0);
}

#[tokio::test]
async fn test_double_report_moves_ratings_once() {
    let (manager, persistence, _chat) = recording_system();
    queue_all(&manager, &euw(), two_per_role()).await.unwrap();
    let scrim = form_scrim(&manager, &euw()).await;

    let before = persistence.get_candidate("huzzle").unwrap().unwrap().rating;
    manager.report_winner(scrim.id, "RED").await.unwrap();
    let after = persistence.get_candidate("huzzle").unwrap().unwrap().rating;
    assert_eq!((after - before).abs(), 25);

    let err = manager.report_winner(scrim.id, "BLUE").await.unwrap_err();
    assert_error(err, |e| matches!(e, MatchmakingError::AlreadyCompleted { .. }));
    assert_eq!(
        persistence.get_candidate("huzzle").unwrap().unwrap().rating,
        after
    );
}

#[tokio::test]
async fn test_zero_loss_delta_still_counts_losses() {
    let mut config = AppConfig::default();
    config.rating.loss_delta = 0;
    scrim_room::config::validate_config(&config).unwrap();

    let (manager, persistence) = test_system(&config, Arc::new(RecordingChatGateway::new()));
    queue_all(&manager, &euw(), two_per_role()).await.unwrap();
    let scrim = form_scrim(&manager, &euw()).await;

    manager.report_winner(scrim.id, "BLUE").await.unwrap();

    for player in scrim.players_on(Side::Red) {
        let stored = persistence.get_candidate(&player.candidate_id).unwrap().unwrap();
        assert_eq!(stored.losses, 1);
        assert_eq!(stored.wins, 0);
    }
    for player in scrim.players_on(Side::Blue) {
        let stored = persistence.get_candidate(&player.candidate_id).unwrap().unwrap();
        assert_eq!(stored.wins, 1);
        assert_eq!(stored.losses, 0);
    }
}

#[tokio::test]
async fn test_report_rejects_bad_input() {
    let (manager, _persistence, _chat) = recording_system();
    queue_all(&manager, &euw(), two_per_role()).await.unwrap();
    let scrim = form_scrim(&manager, &euw()).await;

    let err = manager.report_winner(scrim.id, "purple").await.unwrap_err();
    assert_error(err, |e| matches!(e, MatchmakingError::InvalidSide { .. }));

    let err = manager.report_winner(scrim.id + 100, "blue").await.unwrap_err();
    assert_error(err, |e| matches!(e, MatchmakingError::ScrimNotFound { .. }));

    // The scrim is still open
    assert_eq!(manager.active_scrims().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_failures_do_not_block_scrim() {
    let (manager, persistence) = test_system(&AppConfig::default(), Arc::new(FailingChatGateway));
    queue_all(&manager, &euw(), two_per_role()).await.unwrap();

    let scrim = form_scrim(&manager, &euw()).await;
    assert!(scrim.voice_channel_ids.is_empty());

    let result = manager.report_winner(scrim.id, "red").await.unwrap();
    assert_eq!(result.rating_changes.len(), 10);
    assert!(result.deleted_channels.is_none());
    assert!(result.thread_id.is_none());

    for player in scrim.players_on(Side::Red) {
        let stored = persistence.get_candidate(&player.candidate_id).unwrap().unwrap();
        assert_eq!(stored.wins, 1);
    }

    // Voice creation and two DMs fail on formation; the thread fails on report.
    // Teardown is skipped because no channels were created.
    let stats = manager.get_stats().await.unwrap();
    assert_eq!(stats.gateway_failures, 4);
}

#[tokio::test]
async fn test_fifo_overflow_keeps_eleventh_queued() {
    let (manager, _persistence, _chat) = recording_system();
    let mut candidates = two_per_role();
    candidates.push(candidate("late", Role::Mid, Role::Support, 1500));
    queue_all(&manager, &euw(), candidates).await.unwrap();

    let scrim = form_scrim(&manager, &euw()).await;
    assert!(!scrim.has_player("late"));

    let leftover = manager.queue_members(&euw()).await.unwrap();
    assert_eq!(leftover.len(), 1);
    assert_eq!(leftover[0].id, "late");
}

#[tokio::test]
async fn test_secondary_role_fill() {
    let (manager, _persistence, _chat) = recording_system();
    queue_all(&manager, &euw(), no_support_mains()).await.unwrap();

    let scrim = form_scrim(&manager, &euw()).await;
    assert_eq!(scrim.rating_difference, 50);
    for side in [Side::Blue, Side::Red] {
        assert!(scrim.players_on(side).iter().any(|p| p.role == Role::Support));
    }
}

#[tokio::test]
async fn test_match_removes_players_from_other_region() {
    let (manager, _persistence, _chat) = recording_system();
    let candidates = two_per_role();
    manager
        .join_queue(candidates[0].clone(), &na())
        .await
        .unwrap();
    queue_all(&manager, &euw(), candidates).await.unwrap();

    form_scrim(&manager, &euw()).await;
    assert!(manager.queue_members(&na()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_queue() {
    let (manager, _persistence, _chat) = recording_system();
    let mut candidates = two_per_role();
    candidates.truncate(4);
    queue_all(&manager, &euw(), candidates).await.unwrap();

    assert_eq!(manager.reset_queue(&euw()).await.unwrap(), 4);
    assert!(manager.queue_members(&euw()).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_queue_entries_expire() {
    let mut config = AppConfig::default();
    config.matchmaking.queue_expiry_seconds = 60;
    let (manager, _persistence) = test_system(&config, Arc::new(RecordingChatGateway::new()));

    manager
        .join_queue(candidate("idle", Role::Top, Role::Mid, 1500), &euw())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(manager.queue_members(&euw()).await.unwrap().len(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    tokio::task::yield_now().await;
    assert!(manager.queue_members(&euw()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_match_creation_forms_one_scrim() {
    let (manager, _persistence, _chat) = recording_system();
    queue_all(&manager, &euw(), two_per_role()).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.attempt_match_creation(&euw()).await })
        })
        .collect();

    let mut formed = 0;
    for handle in futures::future::join_all(handles).await {
        if let MatchCreation::Formed(_) = handle.unwrap().unwrap() {
            formed += 1;
        }
    }
    assert_eq!(formed, 1);
    assert_eq!(manager.active_scrims().await.unwrap().len(), 1);
}

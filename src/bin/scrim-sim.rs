//! Scrim Simulation CLI Tool
//!
//! Drives the scrim lifecycle in-process with the logging chat gateway and
//! in-memory persistence.
//!
//! Usage:
//!   cargo run --bin scrim-sim -- --help
//!   cargo run --bin scrim-sim random --seed 7 --winner red
//!   cargo run --bin scrim-sim fixture --name no-support

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scrim_room::config::AppConfig;
use scrim_room::gateway::{InMemoryPersistence, LoggingChatGateway};
use scrim_room::types::{Candidate, MatchCreation, QueueKey, Rank, Region, Role, Side};
use scrim_room::utils::current_timestamp;
use scrim_room::ScrimManager;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scrim-sim")]
#[command(about = "Simulate queueing, team allocation and result reporting for scrim-room")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables apply otherwise
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Guild the simulated queue belongs to
    #[arg(long, default_value = "sim-guild")]
    guild: String,

    /// Queue region (euw or na)
    #[arg(long, default_value = "euw")]
    region: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue randomly generated candidates and play one scrim
    Random {
        /// Number of candidates to queue (the first ten are matched)
        #[arg(short, long, default_value = "10")]
        players: usize,
        /// Seed for candidate generation
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Side to report as winner
        #[arg(short, long, default_value = "blue")]
        winner: String,
    },
    /// Play one scrim with a built-in candidate set
    Fixture {
        /// Fixture name (two-per-role, no-support)
        #[arg(short, long)]
        name: String,
        /// Side to report as winner
        #[arg(short, long, default_value = "blue")]
        winner: String,
    },
}

fn parse_region(region: &str) -> Result<Region> {
    match region.to_lowercase().as_str() {
        "euw" => Ok(Region::Euw),
        "na" => Ok(Region::Na),
        _ => Err(anyhow::anyhow!("Invalid region. Use 'euw' or 'na'")),
    }
}

fn sim_candidate(id: &str, main_role: Role, secondary_role: Role, rating: i32) -> Candidate {
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

fn random_candidates(count: usize, seed: u64) -> Vec<Candidate> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let main_role = Role::ALL[rng.gen_range(0..Role::ALL.len())];
            let secondary_role = Role::ALL[rng.gen_range(0..Role::ALL.len())];
            sim_candidate(
                &format!("player{:02}", i + 1),
                main_role,
                secondary_role,
                rng.gen_range(1000..2500),
            )
        })
        .collect()
}

fn fixture(name: &str) -> Result<Vec<Candidate>> {
    match name {
        "two-per-role" => Ok(vec![
            sim_candidate("huzzle", Role::Top, Role::Mid, 2100),
            sim_candidate("zero", Role::Mid, Role::Top, 1400),
            sim_candidate("rayann", Role::Top, Role::Jungle, 1821),
            sim_candidate("mika", Role::Jungle, Role::Jungle, 2400),
            sim_candidate("mo", Role::Bot, Role::Jungle, 2400),
            sim_candidate("zironic", Role::Support, Role::Bot, 659),
            sim_candidate("kharann", Role::Jungle, Role::Bot, 1700),
            sim_candidate("yyaen", Role::Mid, Role::Bot, 1657),
            sim_candidate("z", Role::Bot, Role::Bot, 1900),
            sim_candidate("tikka", Role::Support, Role::Bot, 1800),
        ]),
        "no-support" => Ok(vec![
            sim_candidate("t1", Role::Top, Role::Mid, 2100),
            sim_candidate("t2", Role::Top, Role::Jungle, 1800),
            sim_candidate("j1", Role::Jungle, Role::Top, 2000),
            sim_candidate("j2", Role::Jungle, Role::Mid, 1700),
            sim_candidate("m1", Role::Mid, Role::Top, 1900),
            sim_candidate("m2", Role::Mid, Role::Jungle, 1600),
            sim_candidate("b1", Role::Bot, Role::Mid, 2200),
            sim_candidate("b2", Role::Bot, Role::Top, 1500),
            sim_candidate("b3", Role::Bot, Role::Support, 1750),
            sim_candidate("b4", Role::Bot, Role::Support, 1650),
        ]),
        _ => Err(anyhow::anyhow!(
            "Unknown fixture. Use 'two-per-role' or 'no-support'"
        )),
    }
}

async fn play(
    manager: &ScrimManager,
    key: &QueueKey,
    candidates: Vec<Candidate>,
    winner: &str,
) -> Result<()> {
    for mut candidate in candidates {
        candidate.region = key.region;
        let candidate = manager.register_candidate(candidate).await?;
        let members = manager.join_queue(candidate, key).await?;
        println!("Queue {}: {} waiting", key, members.len());
    }

    let scrim = match manager.attempt_match_creation(key).await? {
        MatchCreation::Formed(scrim) => scrim,
        MatchCreation::NotEnoughPlayers => {
            println!("Not enough players to form a scrim");
            return Ok(());
        }
    };

    println!(
        "\nScrim #{} formed - rating difference {}",
        scrim.id, scrim.rating_difference
    );
    for side in [Side::Blue, Side::Red] {
        println!("  {}", scrim.team_name(side));
        for player in scrim.players_on(side) {
            println!("    {:<8} {}", player.role.to_string(), player.display_name);
        }
    }

    let leftover = manager.queue_members(key).await?;
    if !leftover.is_empty() {
        println!("  {} candidate(s) stay queued", leftover.len());
    }

    let result = manager.report_winner(scrim.id, winner).await?;
    println!("\nReported winner: {}", winner.to_uppercase());
    for change in &result.rating_changes {
        println!(
            "  {:<10} {:+} -> {}",
            change.candidate_id, change.delta, change.new_rating
        );
    }
    if let Some(channels) = &result.deleted_channels {
        println!("Deleted voice channels: {}", channels.join(", "));
    }

    let stats = manager.get_stats().await?;
    println!(
        "\nStats: {} queued, {} created, {} completed, {} gateway failures",
        stats.candidates_queued, stats.scrims_created, stats.scrims_completed, stats.gateway_failures
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env()?,
    };
    let key = QueueKey::new(cli.guild.clone(), parse_region(&cli.region)?);

    let manager = ScrimManager::new(
        &config,
        Arc::new(InMemoryPersistence::new()),
        Arc::new(LoggingChatGateway::new(config.gateway.clone())),
    );

    match cli.command {
        Commands::Random {
            players,
            seed,
            winner,
        } => play(&manager, &key, random_candidates(players, seed), &winner).await,
        Commands::Fixture { name, winner } => play(&manager, &key, fixture(&name)?, &winner).await,
    }
}

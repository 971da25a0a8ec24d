//! Scrim lifecycle manager
//!
//! This module provides the ScrimManager that orchestrates queueing, team
//! allocation, scrim formation, result reporting and the side effects on the
//! chat platform.

use crate::config::AppConfig;
use crate::error::{MatchmakingError, Result};
use crate::gateway::{ChatGateway, PersistenceGateway};
use crate::matchmaking::{assign_roles, random_team_balance, scouting_link, Matchmaker};
use crate::metrics::MetricsCollector;
use crate::queue::QueueRegistry;
use crate::scrim::registry::ScrimRegistry;
use crate::types::{
    Candidate, CandidateId, MatchCreation, MatchmakingStatus, Player, QueueKey, RatingChange,
    Region, Scrim, ScrimId, ScrimResult, ScrimStatus, Side, MATCH_SIZE,
};
use crate::utils::{current_timestamp, rating_difference};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Statistics about scrim manager operations
#[derive(Debug, Clone, Default)]
pub struct ScrimManagerStats {
    /// Successful queue joins
    pub candidates_queued: u64,
    /// Joins refused because of the candidate's state
    pub joins_rejected: u64,
    /// Total scrims formed
    pub scrims_created: u64,
    /// Scrims formed by the random fallback
    pub random_fallbacks: u64,
    /// Total winner reports applied
    pub scrims_completed: u64,
    /// Best-effort gateway calls that failed
    pub gateway_failures: u64,
    /// Scrims started and not yet completed
    pub active_scrims: usize,
}

/// Rating deltas applied on a winner report
#[derive(Debug, Clone, Copy)]
struct RatingDeltas {
    win: i32,
    loss: i32,
}

/// The main scrim manager
#[derive(Clone)]
pub struct ScrimManager {
    /// Candidate queues and the in-match set
    queues: QueueRegistry,
    /// Formed scrims by id
    scrims: ScrimRegistry,
    /// Team allocation pipeline
    matchmaker: Matchmaker,
    /// Storage for candidates and scrims
    persistence: Arc<dyn PersistenceGateway>,
    /// Chat platform side effects
    chat: Arc<dyn ChatGateway>,
    deltas: RatingDeltas,
    random_fallback: bool,
    /// Serializes match creation
    creation_lock: Arc<Mutex<()>>,
    /// Manager statistics
    stats: Arc<RwLock<ScrimManagerStats>>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
}

impl ScrimManager {
    /// Create a new scrim manager
    pub fn new(
        config: &AppConfig,
        persistence: Arc<dyn PersistenceGateway>,
        chat: Arc<dyn ChatGateway>,
    ) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(config, persistence, chat, metrics_collector)
    }

    /// Create a new scrim manager with metrics collector
    pub fn with_metrics(
        config: &AppConfig,
        persistence: Arc<dyn PersistenceGateway>,
        chat: Arc<dyn ChatGateway>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            queues: QueueRegistry::new(config.queue_expiry()),
            scrims: ScrimRegistry::new(),
            matchmaker: Matchmaker::from_settings(&config.matchmaking),
            persistence,
            chat,
            deltas: RatingDeltas {
                win: config.rating.win_delta,
                loss: config.rating.loss_delta,
            },
            random_fallback: config.matchmaking.random_fallback,
            creation_lock: Arc::new(Mutex::new(())),
            stats: Arc::new(RwLock::new(ScrimManagerStats::default())),
            metrics_collector,
        }
    }

    /// Queue registry backing this manager
    pub fn queues(&self) -> &QueueRegistry {
        &self.queues
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Store or refresh a candidate profile
    pub async fn register_candidate(&self, candidate: Candidate) -> Result<Candidate> {
        let candidate = self.persistence.upsert_candidate(candidate).await?;
        debug!(
            "Registered candidate {} ({} / {}, rating {})",
            candidate.id, candidate.main_role, candidate.secondary_role, candidate.rating
        );
        Ok(candidate)
    }

    /// Add a candidate to a queue and return the queue in join order
    pub async fn join_queue(&self, candidate: Candidate, key: &QueueKey) -> Result<Vec<Candidate>> {
        let candidate_id = candidate.id.clone();

        match self.queues.join(candidate, key) {
            Ok(members) => {
                self.update_stats(|stats| stats.candidates_queued += 1)?;
                self.metrics_collector.record_queue_join("joined");
                self.refresh_queue_gauge(key.region)?;
                info!(
                    "Queue {} now has {} candidate(s) after {} joined",
                    key,
                    members.len(),
                    candidate_id
                );
                Ok(members)
            }
            Err(e) => {
                let outcome = match e.downcast_ref::<MatchmakingError>() {
                    Some(MatchmakingError::AlreadyQueued { .. }) => "already_queued",
                    Some(MatchmakingError::AlreadyInMatch { .. }) => "already_in_match",
                    _ => "error",
                };
                self.update_stats(|stats| stats.joins_rejected += 1)?;
                self.metrics_collector.record_queue_join(outcome);
                debug!("Join of {} to {} refused: {}", candidate_id, key, e);
                Err(e)
            }
        }
    }

    /// Remove a candidate from a queue and return the remaining members
    pub async fn leave_queue(&self, candidate_id: &str, key: &QueueKey) -> Result<Vec<Candidate>> {
        match self.queues.leave(candidate_id, key) {
            Ok(members) => {
                self.metrics_collector.record_queue_leave("left");
                self.refresh_queue_gauge(key.region)?;
                Ok(members)
            }
            Err(e) => {
                self.metrics_collector.record_queue_leave("not_queued");
                Err(e)
            }
        }
    }

    pub async fn queue_members(&self, key: &QueueKey) -> Result<Vec<Candidate>> {
        self.queues.members(key)
    }

    pub async fn check_readiness(&self, key: &QueueKey) -> Result<MatchmakingStatus> {
        self.queues.check_readiness(key)
    }

    /// Clear a queue without notifying its members
    pub async fn reset_queue(&self, key: &QueueKey) -> Result<usize> {
        let cleared = self.queues.reset(key)?;
        self.refresh_queue_gauge(key.region)?;
        Ok(cleared)
    }

    /// Form a scrim from the first ten queued candidates, if there are ten
    pub async fn attempt_match_creation(&self, key: &QueueKey) -> Result<MatchCreation> {
        let _creation = self.creation_lock.lock().await;

        if self.queues.check_readiness(key)? == MatchmakingStatus::NotEnoughPlayers {
            return Ok(MatchCreation::NotEnoughPlayers);
        }

        let ids: Vec<CandidateId> = self
            .queues
            .front(key, MATCH_SIZE)?
            .into_iter()
            .map(|c| c.id)
            .collect();

        let candidates = self.persistence.get_candidates_by_ids(&ids).await?;
        if candidates.len() < MATCH_SIZE {
            warn!(
                "Only {} of {} queued candidates in {} could be loaded, not forming a scrim. Missing: {}",
                candidates.len(),
                MATCH_SIZE,
                key,
                missing_ids(&ids, &candidates).join(", ")
            );
            return Ok(MatchCreation::NotEnoughPlayers);
        }

        let timer = self.metrics_collector.start_timer();
        let (players, difference, random) = self.allocate(&candidates)?;
        self.metrics_collector.record_matchmaking(timer.stop());

        if let Err(e) = self.queues.pop(key, &ids) {
            if let Some(MatchmakingError::NotQueued { candidate_id }) =
                e.downcast_ref::<MatchmakingError>()
            {
                info!(
                    "Candidate {} left {} during match creation, not forming a scrim",
                    candidate_id, key
                );
                return Ok(MatchCreation::NotEnoughPlayers);
            }
            return Err(e);
        }

        let scrim = Scrim {
            id: 0,
            guild_id: key.guild_id.clone(),
            region: key.region,
            status: ScrimStatus::Started,
            players,
            voice_channel_ids: Vec::new(),
            winner: None,
            rating_difference: difference,
            created_at: current_timestamp(),
            completed_at: None,
        };

        let mut scrim = match self.persistence.persist_scrim(scrim).await {
            Ok(scrim) => scrim,
            Err(e) => {
                error!("Failed to persist new scrim for {}: {}", key, e);
                self.queues.release(&ids)?;
                return Err(MatchmakingError::PersistenceFailed {
                    message: e.to_string(),
                }
                .into());
            }
        };
        self.scrims.insert(scrim.clone())?;

        self.update_stats(|stats| {
            stats.scrims_created += 1;
            if random {
                stats.random_fallbacks += 1;
            }
        })?;
        self.metrics_collector.record_scrim_created(random, difference);
        self.refresh_queue_gauge(key.region)?;

        info!(
            "Scrim {} started in {} - rating difference: {}, random: {}",
            scrim.id, key, difference, random
        );

        match self
            .chat
            .create_team_voice_channels(&scrim.guild_id, scrim.team_names())
            .await
        {
            Ok(channel_ids) => {
                scrim.voice_channel_ids = channel_ids.to_vec();
                self.scrims
                    .set_voice_channels(scrim.id, scrim.voice_channel_ids.clone())?;
            }
            Err(e) => self.gateway_failure("create_team_voice_channels", &e)?,
        }

        self.notify_players(&scrim, &candidates).await?;

        Ok(MatchCreation::Formed(scrim))
    }

    /// Run the pipeline, falling back to a random split when enabled
    fn allocate(&self, candidates: &[Candidate]) -> Result<(Vec<Player>, i32, bool)> {
        match self.matchmaker.matchmake(candidates) {
            Ok(matchup) => Ok((assign_roles(&matchup), matchup.rating_difference, false)),
            Err(e) if self.random_fallback && is_no_valid_matchup(&e) => {
                warn!("No valid matchup, falling back to a random split");
                let players = random_team_balance(candidates, &mut rand::thread_rng())?;
                let difference = side_difference(&players, candidates);
                Ok((players, difference, true))
            }
            Err(e) => Err(e),
        }
    }

    /// DM each side its team name and a scouting link for the opponents
    async fn notify_players(&self, scrim: &Scrim, candidates: &[Candidate]) -> Result<()> {
        for side in [Side::Blue, Side::Red] {
            let recipients: Vec<CandidateId> = scrim
                .players_on(side)
                .iter()
                .map(|p| p.candidate_id.clone())
                .collect();
            let opponents: Vec<Candidate> = candidates
                .iter()
                .filter(|c| {
                    scrim
                        .players_on(side.opposite())
                        .iter()
                        .any(|p| p.candidate_id == c.id)
                })
                .cloned()
                .collect();

            let content = format!(
                "Scrim #{} is starting. You are on {}.\nEnemy team: {}",
                scrim.id,
                scrim.team_name(side),
                scouting_link(&opponents, scrim.region)
            );

            match self.chat.send_direct_message(&recipients, &content).await {
                Ok(delivered) if delivered < recipients.len() => {
                    warn!(
                        "Delivered {} of {} match messages for {}",
                        delivered,
                        recipients.len(),
                        scrim.team_name(side)
                    );
                }
                Ok(_) => {}
                Err(e) => self.gateway_failure("send_direct_message", &e)?,
            }
        }
        Ok(())
    }

    /// Record the winner of a scrim and apply rating changes.
    ///
    /// `side` is the caller's raw input ("BLUE" / "RED", any case).
    pub async fn report_winner(&self, scrim_id: ScrimId, side: &str) -> Result<ScrimResult> {
        let winner: Side = side.parse()?;
        let scrim = self.scrims.complete(scrim_id, winner)?;
        let player_ids: Vec<CandidateId> =
            scrim.players.iter().map(|p| p.candidate_id.clone()).collect();

        let committed = self.commit_result(&scrim, winner).await;
        self.queues.release(&player_ids)?;
        let rating_changes = committed?;

        self.update_stats(|stats| stats.scrims_completed += 1)?;
        self.metrics_collector.record_scrim_completed(winner);
        info!(
            "Scrim {} completed - winner: {}, ratings updated: {}",
            scrim_id,
            winner,
            rating_changes.len()
        );

        let deleted_channels = if scrim.voice_channel_ids.is_empty() {
            None
        } else {
            match self
                .chat
                .delete_voice_channels(&scrim.guild_id, &scrim.voice_channel_ids)
                .await
            {
                Ok(Some(deleted)) => Some(deleted),
                Ok(None) => {
                    warn!("Voice channels for scrim {} were already gone", scrim_id);
                    None
                }
                Err(e) => {
                    self.gateway_failure("delete_voice_channels", &e)?;
                    None
                }
            }
        };

        let thread_id = match self
            .chat
            .create_result_thread(scrim_id, winner, scrim.team_names())
            .await
        {
            Ok(thread_id) => Some(thread_id),
            Err(e) => {
                self.gateway_failure("create_result_thread", &e)?;
                None
            }
        };

        Ok(ScrimResult {
            scrim,
            rating_changes,
            deleted_channels,
            thread_id,
        })
    }

    /// Persist the completed scrim and move every player's rating
    async fn commit_result(&self, scrim: &Scrim, winner: Side) -> Result<Vec<RatingChange>> {
        self.persistence
            .persist_scrim(scrim.clone())
            .await
            .map_err(|e| MatchmakingError::PersistenceFailed {
                message: e.to_string(),
            })?;

        let mut changes = Vec::with_capacity(scrim.players.len());
        for player in &scrim.players {
            let won = player.side == winner;
            let delta = if won {
                self.deltas.win
            } else {
                -self.deltas.loss
            };
            let new_rating = self
                .persistence
                .update_rating(&player.candidate_id, delta, won)
                .await
                .map_err(|e| MatchmakingError::PersistenceFailed {
                    message: e.to_string(),
                })?;
            changes.push(RatingChange {
                candidate_id: player.candidate_id.clone(),
                side: player.side,
                delta,
                new_rating,
            });
        }
        Ok(changes)
    }

    pub async fn scrim(&self, scrim_id: ScrimId) -> Result<Option<Scrim>> {
        self.scrims.get(scrim_id)
    }

    pub async fn active_scrims(&self) -> Result<Vec<Scrim>> {
        self.scrims.active()
    }

    /// Get manager statistics
    pub async fn get_stats(&self) -> Result<ScrimManagerStats> {
        let mut stats = self
            .stats
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?
            .clone();
        stats.active_scrims = self.scrims.active()?.len();
        self.metrics_collector.update_from_scrim_stats(&stats);
        // Expired entries leave without touching the gauge
        for region in Region::ALL {
            self.refresh_queue_gauge(region)?;
        }
        Ok(stats)
    }

    fn refresh_queue_gauge(&self, region: Region) -> Result<()> {
        let queued = self.queues.region_size(region)?;
        self.metrics_collector.set_queue_size(region, queued);
        Ok(())
    }

    fn gateway_failure(&self, operation: &str, err: &anyhow::Error) -> Result<()> {
        error!("Gateway operation {} failed: {}", operation, err);
        self.metrics_collector.record_gateway_failure(operation);
        self.update_stats(|stats| stats.gateway_failures += 1)
    }

    fn update_stats(&self, update: impl FnOnce(&mut ScrimManagerStats)) -> Result<()> {
        let mut stats = self
            .stats
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            })?;
        update(&mut stats);
        Ok(())
    }
}

fn is_no_valid_matchup(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<MatchmakingError>(),
        Some(MatchmakingError::NoValidMatchup)
    )
}

/// Queued ids persistence returned no profile for
fn missing_ids(ids: &[CandidateId], candidates: &[Candidate]) -> Vec<CandidateId> {
    ids.iter()
        .filter(|id| !candidates.iter().any(|c| &c.id == *id))
        .cloned()
        .collect()
}

/// Absolute difference of the two sides' rating sums
fn side_difference(players: &[Player], candidates: &[Candidate]) -> i32 {
    let ratings: HashMap<&str, i32> = candidates
        .iter()
        .map(|c| (c.id.as_str(), c.rating))
        .collect();
    let sum = |side: Side| -> i32 {
        players
            .iter()
            .filter(|p| p.side == side)
            .filter_map(|p| ratings.get(p.candidate_id.as_str()))
            .sum()
    };
    rating_difference(sum(Side::Blue), sum(Side::Red))
}

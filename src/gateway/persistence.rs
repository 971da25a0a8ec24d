//! Persistence gateway for candidate profiles and scrim records
//!
//! The relational store lives outside this service; the core only depends on
//! the [`PersistenceGateway`] trait. [`InMemoryPersistence`] backs the
//! binaries and tests.

use crate::error::{MatchmakingError, Result};
use crate::types::{Candidate, CandidateId, Scrim, ScrimId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// Storage operations the matchmaking core consumes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch candidates in the order of `ids`; unknown ids are skipped
    async fn get_candidates_by_ids(&self, ids: &[CandidateId]) -> Result<Vec<Candidate>>;

    /// Create or replace a candidate profile
    async fn upsert_candidate(&self, candidate: Candidate) -> Result<Candidate>;

    /// Store a scrim, assigning an id when it has none yet
    async fn persist_scrim(&self, scrim: Scrim) -> Result<Scrim>;

    /// Apply a rating delta, count the result as a win or a loss and return
    /// the new rating
    async fn update_rating(&self, candidate_id: &str, delta: i32, won: bool) -> Result<i32>;
}

/// In-memory persistence implementation
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    candidates: RwLock<HashMap<CandidateId, Candidate>>,
    scrims: RwLock<HashMap<ScrimId, Scrim>>,
    next_scrim_id: AtomicU64,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored copy of a scrim (for admin/debugging)
    pub fn get_scrim(&self, scrim_id: ScrimId) -> Result<Option<Scrim>> {
        let scrims = self
            .scrims
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims read lock".to_string(),
            })?;
        Ok(scrims.get(&scrim_id).cloned())
    }

    pub fn get_candidate(&self, candidate_id: &str) -> Result<Option<Candidate>> {
        let candidates =
            self.candidates
                .read()
                .map_err(|_| MatchmakingError::InternalError {
                    message: "Failed to acquire candidates read lock".to_string(),
                })?;
        Ok(candidates.get(candidate_id).cloned())
    }

    pub fn candidate_count(&self) -> Result<usize> {
        let candidates =
            self.candidates
                .read()
                .map_err(|_| MatchmakingError::InternalError {
                    message: "Failed to acquire candidates read lock".to_string(),
                })?;
        Ok(candidates.len())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryPersistence {
    async fn get_candidates_by_ids(&self, ids: &[CandidateId]) -> Result<Vec<Candidate>> {
        let candidates =
            self.candidates
                .read()
                .map_err(|_| MatchmakingError::InternalError {
                    message: "Failed to acquire candidates read lock".to_string(),
                })?;

        Ok(ids
            .iter()
            .filter_map(|id| candidates.get(id).cloned())
            .collect())
    }

    async fn upsert_candidate(&self, candidate: Candidate) -> Result<Candidate> {
        let mut candidates =
            self.candidates
                .write()
                .map_err(|_| MatchmakingError::InternalError {
                    message: "Failed to acquire candidates write lock".to_string(),
                })?;

        candidates.insert(candidate.id.clone(), candidate.clone());
        Ok(candidate)
    }

    async fn persist_scrim(&self, mut scrim: Scrim) -> Result<Scrim> {
        if scrim.id == 0 {
            scrim.id = self.next_scrim_id.fetch_add(1, Ordering::SeqCst) + 1;
        }

        let mut scrims = self
            .scrims
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims write lock".to_string(),
            })?;
        scrims.insert(scrim.id, scrim.clone());

        debug!("Persisted scrim {} ({:?})", scrim.id, scrim.status);
        Ok(scrim)
    }

    async fn update_rating(&self, candidate_id: &str, delta: i32, won: bool) -> Result<i32> {
        let mut candidates =
            self.candidates
                .write()
                .map_err(|_| MatchmakingError::InternalError {
                    message: "Failed to acquire candidates write lock".to_string(),
                })?;

        let candidate =
            candidates
                .get_mut(candidate_id)
                .ok_or_else(|| MatchmakingError::PersistenceFailed {
                    message: format!("Unknown candidate {}", candidate_id),
                })?;

        candidate.rating += delta;
        if won {
            candidate.wins += 1;
        } else {
            candidate.losses += 1;
        }

        Ok(candidate.rating)
    }
}

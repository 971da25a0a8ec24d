//! Per-guild, per-region candidate queues
//!
//! All queue state, including the set of candidates currently playing, sits
//! behind a single mutex so that check-and-insert and pop are atomic.

use crate::error::{MatchmakingError, Result};
use crate::queue::expiry::ExpiryHandle;
use crate::types::{Candidate, CandidateId, MatchmakingStatus, QueueKey, Region, MATCH_SIZE};
use crate::utils::{current_timestamp, format_duration_secs};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::{debug, info};

/// A queued candidate with its join time and pending expiry
#[derive(Debug)]
struct QueueEntry {
    candidate: Candidate,
    joined_at: DateTime<Utc>,
    generation: u64,
    expiry: Option<ExpiryHandle>,
}

impl QueueEntry {
    fn cancel_expiry(&mut self) {
        if let Some(expiry) = self.expiry.take() {
            expiry.cancel();
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    /// Entries in join order
    queues: HashMap<QueueKey, Vec<QueueEntry>>,
    /// Candidates in a scrim that has not completed
    in_match: HashSet<CandidateId>,
    next_generation: u64,
}

impl QueueState {
    fn position(&self, key: &QueueKey, candidate_id: &str) -> Option<usize> {
        self.queues
            .get(key)?
            .iter()
            .position(|e| e.candidate.id == candidate_id)
    }

    fn candidates(&self, key: &QueueKey) -> Vec<Candidate> {
        self.queues
            .get(key)
            .map(|entries| entries.iter().map(|e| e.candidate.clone()).collect())
            .unwrap_or_default()
    }

    fn remove(&mut self, key: &QueueKey, candidate_id: &str) -> Option<QueueEntry> {
        let index = self.position(key, candidate_id)?;
        let entries = self.queues.get_mut(key)?;
        let entry = entries.remove(index);
        if entries.is_empty() {
            self.queues.remove(key);
        }
        Some(entry)
    }

    /// Expiry path: only the timer's own entry may be removed
    fn remove_if_generation(&mut self, key: &QueueKey, candidate_id: &str, generation: u64) -> bool {
        let current = self
            .position(key, candidate_id)
            .and_then(|i| self.queues.get(key).map(|entries| entries[i].generation));
        if current != Some(generation) {
            return false;
        }
        self.remove(key, candidate_id).is_some()
    }
}

/// Shared registry of all queues
#[derive(Debug, Clone)]
pub struct QueueRegistry {
    state: Arc<Mutex<QueueState>>,
    expiry: Duration,
}

impl QueueRegistry {
    /// Create a registry whose entries expire after `expiry`
    pub fn new(expiry: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>> {
        self.state
            .lock()
            .map_err(|_| {
                MatchmakingError::InternalError {
                    message: "Failed to acquire queue lock".to_string(),
                }
                .into()
            })
    }

    /// Add a candidate and return the queue in join order
    pub fn join(&self, candidate: Candidate, key: &QueueKey) -> Result<Vec<Candidate>> {
        let mut state = self.lock()?;

        if state.in_match.contains(&candidate.id) {
            return Err(MatchmakingError::AlreadyInMatch {
                candidate_id: candidate.id,
            }
            .into());
        }
        if state.position(key, &candidate.id).is_some() {
            return Err(MatchmakingError::AlreadyQueued {
                candidate_id: candidate.id,
            }
            .into());
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let expiry = self.schedule_expiry(key.clone(), candidate.id.clone(), generation);

        info!("Candidate {} joined queue {}", candidate.id, key);
        state.queues.entry(key.clone()).or_default().push(QueueEntry {
            candidate,
            joined_at: current_timestamp(),
            generation,
            expiry: Some(expiry),
        });

        Ok(state.candidates(key))
    }

    fn schedule_expiry(&self, key: QueueKey, candidate_id: CandidateId, generation: u64) -> ExpiryHandle {
        let state: Weak<Mutex<QueueState>> = Arc::downgrade(&self.state);
        let dwell = self.expiry;

        ExpiryHandle::schedule(generation, dwell, move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let Ok(mut state) = state.lock() else {
                return;
            };
            if state.remove_if_generation(&key, &candidate_id, generation) {
                info!(
                    "Candidate {} expired from queue {} after {}",
                    candidate_id,
                    key,
                    format_duration_secs(dwell.as_secs())
                );
            }
        })
    }

    /// Remove a candidate and return the remaining queue
    pub fn leave(&self, candidate_id: &str, key: &QueueKey) -> Result<Vec<Candidate>> {
        let mut state = self.lock()?;

        let mut entry =
            state
                .remove(key, candidate_id)
                .ok_or_else(|| MatchmakingError::NotQueued {
                    candidate_id: candidate_id.to_string(),
                })?;
        entry.cancel_expiry();

        info!("Candidate {} left queue {}", candidate_id, key);
        Ok(state.candidates(key))
    }

    /// Queue snapshot in join order
    pub fn members(&self, key: &QueueKey) -> Result<Vec<Candidate>> {
        Ok(self.lock()?.candidates(key))
    }

    pub fn size(&self, key: &QueueKey) -> Result<usize> {
        Ok(self.lock()?.queues.get(key).map_or(0, Vec::len))
    }

    /// Join time of a queued candidate
    pub fn joined_at(&self, candidate_id: &str, key: &QueueKey) -> Result<Option<DateTime<Utc>>> {
        let state = self.lock()?;
        Ok(state
            .position(key, candidate_id)
            .and_then(|i| state.queues.get(key).map(|entries| entries[i].joined_at)))
    }

    pub fn check_readiness(&self, key: &QueueKey) -> Result<MatchmakingStatus> {
        if self.size(key)? >= MATCH_SIZE {
            Ok(MatchmakingStatus::Ready)
        } else {
            Ok(MatchmakingStatus::NotEnoughPlayers)
        }
    }

    /// The first `n` candidates by join time
    pub fn front(&self, key: &QueueKey, n: usize) -> Result<Vec<Candidate>> {
        let state = self.lock()?;
        Ok(state
            .queues
            .get(key)
            .map(|entries| entries.iter().take(n).map(|e| e.candidate.clone()).collect())
            .unwrap_or_default())
    }

    /// Take `ids` out of every queue and mark them as playing.
    ///
    /// Nothing changes unless every id is still queued under `key`.
    pub fn pop(&self, key: &QueueKey, ids: &[CandidateId]) -> Result<()> {
        let mut state = self.lock()?;

        if let Some(missing) = ids.iter().find(|id| state.position(key, id).is_none()) {
            return Err(MatchmakingError::NotQueued {
                candidate_id: missing.clone(),
            }
            .into());
        }

        let keys: Vec<QueueKey> = state.queues.keys().cloned().collect();
        for id in ids {
            for queue_key in &keys {
                if let Some(mut entry) = state.remove(queue_key, id) {
                    entry.cancel_expiry();
                }
            }
            state.in_match.insert(id.clone());
        }

        debug!("Popped {} candidates from queue {}", ids.len(), key);
        Ok(())
    }

    /// Clear the in-match mark so the candidates may queue again
    pub fn release(&self, ids: &[CandidateId]) -> Result<()> {
        let mut state = self.lock()?;
        for id in ids {
            state.in_match.remove(id);
        }
        Ok(())
    }

    pub fn is_in_match(&self, candidate_id: &str) -> Result<bool> {
        Ok(self.lock()?.in_match.contains(candidate_id))
    }

    /// Drop every entry of a queue without notifying anyone
    pub fn reset(&self, key: &QueueKey) -> Result<usize> {
        let mut state = self.lock()?;
        let entries = state.queues.remove(key).unwrap_or_default();
        let cleared = entries.len();
        for mut entry in entries {
            entry.cancel_expiry();
        }

        info!("Reset queue {} ({} candidates removed)", key, cleared);
        Ok(cleared)
    }

    /// Number of candidates queued in a region, across every guild
    pub fn region_size(&self, region: Region) -> Result<usize> {
        Ok(self
            .lock()?
            .queues
            .iter()
            .filter(|(key, _)| key.region == region)
            .map(|(_, entries)| entries.len())
            .sum())
    }

    /// Number of candidates across all queues
    pub fn total_queued(&self) -> Result<usize> {
        Ok(self.lock()?.queues.values().map(Vec::len).sum())
    }

    #[cfg(test)]
    fn expire(&self, key: &QueueKey, candidate_id: &str, generation: u64) -> Result<bool> {
        Ok(self
            .lock()?
            .remove_if_generation(key, candidate_id, generation))
    }

    #[cfg(test)]
    fn generation_of(&self, key: &QueueKey, candidate_id: &str) -> Option<u64> {
        let state = self.state.lock().ok()?;
        let index = state.position(key, candidate_id)?;
        state.queues.get(key).map(|entries| entries[index].generation)
    }
}

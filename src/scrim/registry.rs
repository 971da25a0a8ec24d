//! Registry of formed scrims

use crate::error::{MatchmakingError, Result};
use crate::types::{Scrim, ScrimId, ScrimStatus, Side};
use crate::utils::current_timestamp;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Scrims by id, shared between clones
#[derive(Debug, Clone, Default)]
pub struct ScrimRegistry {
    scrims: Arc<RwLock<HashMap<ScrimId, Scrim>>>,
}

impl ScrimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, scrim: Scrim) -> Result<()> {
        let mut scrims = self
            .scrims
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims write lock".to_string(),
            })?;
        scrims.insert(scrim.id, scrim);
        Ok(())
    }

    pub fn get(&self, scrim_id: ScrimId) -> Result<Option<Scrim>> {
        let scrims = self
            .scrims
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims read lock".to_string(),
            })?;
        Ok(scrims.get(&scrim_id).cloned())
    }

    pub fn set_voice_channels(&self, scrim_id: ScrimId, channel_ids: Vec<String>) -> Result<()> {
        let mut scrims = self
            .scrims
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims write lock".to_string(),
            })?;
        let scrim = scrims
            .get_mut(&scrim_id)
            .ok_or(MatchmakingError::ScrimNotFound { scrim_id })?;
        scrim.voice_channel_ids = channel_ids;
        Ok(())
    }

    /// Mark a scrim COMPLETED with `winner` and return the updated copy.
    ///
    /// Check and transition happen under one write lock, so only the first
    /// report for a scrim succeeds.
    pub fn complete(&self, scrim_id: ScrimId, winner: Side) -> Result<Scrim> {
        let mut scrims = self
            .scrims
            .write()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims write lock".to_string(),
            })?;

        let scrim = scrims
            .get_mut(&scrim_id)
            .ok_or(MatchmakingError::ScrimNotFound { scrim_id })?;

        if scrim.status == ScrimStatus::Completed {
            return Err(MatchmakingError::AlreadyCompleted { scrim_id }.into());
        }
        if scrim.players_on(winner).is_empty() {
            return Err(MatchmakingError::InvalidSide {
                side: winner.to_string(),
            }
            .into());
        }

        scrim.status = ScrimStatus::Completed;
        scrim.winner = Some(winner);
        scrim.completed_at = Some(current_timestamp());
        Ok(scrim.clone())
    }

    /// Scrims that have not completed, oldest first
    pub fn active(&self) -> Result<Vec<Scrim>> {
        let scrims = self
            .scrims
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims read lock".to_string(),
            })?;
        let mut active: Vec<Scrim> = scrims
            .values()
            .filter(|s| s.status == ScrimStatus::Started)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.id);
        Ok(active)
    }

    pub fn len(&self) -> Result<usize> {
        let scrims = self
            .scrims
            .read()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire scrims read lock".to_string(),
            })?;
        Ok(scrims.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

//! Error types for the scrim matchmaking service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Callers that need to react to a specific failure
//! downcast to [`MatchmakingError`].

use crate::types::{CandidateId, ScrimId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Candidate {candidate_id} is already in the queue")]
    AlreadyQueued { candidate_id: CandidateId },

    #[error("Candidate {candidate_id} is not in the specified queue")]
    NotQueued { candidate_id: CandidateId },

    #[error("Candidate {candidate_id} is already in a game, report the match before queuing again")]
    AlreadyInMatch { candidate_id: CandidateId },

    #[error("Invalid winning side: {side}")]
    InvalidSide { side: String },

    #[error("Scrim {scrim_id} has already been completed")]
    AlreadyCompleted { scrim_id: ScrimId },

    #[error("Scrim not found: {scrim_id}")]
    ScrimNotFound { scrim_id: ScrimId },

    #[error("No valid matchup could be formed from the queued candidates")]
    NoValidMatchup,

    #[error("Matchmaking invariant violated: {reason}")]
    ComputationInvariant { reason: String },

    #[error("Gateway operation '{operation}' failed: {message}")]
    GatewayFailed { operation: String, message: String },

    #[error("Persistence operation failed: {message}")]
    PersistenceFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// Whether the error was caused by the caller's own queue/scrim state
    pub fn is_user_state_error(&self) -> bool {
        matches!(
            self,
            MatchmakingError::AlreadyQueued { .. }
                | MatchmakingError::NotQueued { .. }
                | MatchmakingError::AlreadyInMatch { .. }
                | MatchmakingError::InvalidSide { .. }
                | MatchmakingError::AlreadyCompleted { .. }
        )
    }
}

//! Scrim Room - role-balanced 5v5 scrim matchmaking
//!
//! This crate queues candidates per guild and region, splits ten of them into
//! two rating-balanced teams with one player per role, and tracks the scrim
//! from formation to the reported result.

pub mod config;
pub mod error;
pub mod gateway;
pub mod matchmaking;
pub mod metrics;
pub mod queue;
pub mod scrim;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use gateway::{ChatGateway, InMemoryPersistence, LoggingChatGateway, PersistenceGateway};
pub use matchmaking::{Matchmaker, Matchup};
pub use queue::QueueRegistry;
pub use scrim::{ScrimManager, ScrimManagerStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Main application configuration
//!
//! This module defines the primary configuration structures for the scrim-room
//! service, including environment variable and TOML file loading and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
    pub rating: RatingSettings,
    pub gateway: GatewaySettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health and metrics endpoints
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Queue and matchmaking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// How long a candidate may sit in a queue before being removed
    pub queue_expiry_seconds: u64,
    /// Rating used for a candidate placed on their secondary role
    pub offrole_penalty: i32,
    /// Fall back to a random split when no role-balanced matchup exists
    pub random_fallback: bool,
}

/// Flat rating adjustment applied after a reported result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    pub win_delta: i32,
    pub loss_delta: i32,
    /// Rating assigned to newly registered candidates
    pub initial_rating: i32,
}

/// Chat platform settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Category team voice channels are created under
    pub voice_category_id: Option<String>,
    /// Forum channel result threads are posted in
    pub discussion_channel_id: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "scrim-room".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            queue_expiry_seconds: 8 * 60 * 60, // 8 hours
            offrole_penalty: 200,
            random_fallback: false,
        }
    }
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            win_delta: 25,
            loss_delta: 25,
            initial_rating: 1500,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(port) = parse_env("HEALTH_PORT")? {
            self.service.health_port = port;
        }
        if let Some(timeout) = parse_env("SHUTDOWN_TIMEOUT_SECONDS")? {
            self.service.shutdown_timeout_seconds = timeout;
        }

        // Matchmaking settings
        if let Some(expiry) = parse_env("QUEUE_EXPIRY_SECONDS")? {
            self.matchmaking.queue_expiry_seconds = expiry;
        }
        if let Some(penalty) = parse_env("OFFROLE_PENALTY")? {
            self.matchmaking.offrole_penalty = penalty;
        }
        if let Some(fallback) = parse_env("RANDOM_FALLBACK")? {
            self.matchmaking.random_fallback = fallback;
        }

        // Rating settings
        if let Some(delta) = parse_env("RATING_WIN_DELTA")? {
            self.rating.win_delta = delta;
        }
        if let Some(delta) = parse_env("RATING_LOSS_DELTA")? {
            self.rating.loss_delta = delta;
        }

        // Gateway settings
        if let Ok(category) = env::var("VOICE_CATEGORY_ID") {
            self.gateway.voice_category_id = Some(category);
        }
        if let Ok(channel) = env::var("DISCUSSION_CHANNEL_ID") {
            self.gateway.discussion_channel_id = Some(channel);
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get queue dwell time as Duration
    pub fn queue_expiry(&self) -> Duration {
        Duration::from_secs(self.matchmaking.queue_expiry_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.matchmaking.queue_expiry_seconds == 0 {
        return Err(anyhow!("Queue expiry must be greater than 0"));
    }
    if config.matchmaking.offrole_penalty < 0 {
        return Err(anyhow!("Off-role penalty rating cannot be negative"));
    }

    if config.rating.win_delta < 0 || config.rating.loss_delta < 0 {
        return Err(anyhow!("Rating deltas must not be negative"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.queue_expiry(), Duration::from_secs(28_800));
        assert_eq!(config.matchmaking.offrole_penalty, 200);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let mut config = AppConfig::default();
        config.matchmaking.queue_expiry_seconds = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [matchmaking]
            offrole_penalty = 350

            [rating]
            win_delta = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.matchmaking.offrole_penalty, 350);
        assert_eq!(config.matchmaking.queue_expiry_seconds, 28_800);
        assert_eq!(config.rating.win_delta, 20);
        assert_eq!(config.rating.loss_delta, 25);
        assert_eq!(config.service.name, "scrim-room");
    }
}

//! Chat platform gateway
//!
//! Voice channels, direct messages and result threads are provided by the chat
//! platform. The core talks to it through [`ChatGateway`]; every call may fail
//! on its own and callers treat failures as best-effort.

use crate::config::GatewaySettings;
use crate::error::{MatchmakingError, Result};
use crate::types::{CandidateId, GuildId, ScrimId, Side};
use crate::utils::generate_resource_id;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// Maximum members per team voice channel
pub const VOICE_USER_LIMIT: usize = 5;

/// Chat platform operations the scrim lifecycle consumes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Create one voice channel per team name and return their ids
    async fn create_team_voice_channels(
        &self,
        guild_id: &str,
        team_names: [String; 2],
    ) -> Result<[String; 2]>;

    /// Delete team voice channels; `None` when none of the ids are active
    async fn delete_voice_channels(
        &self,
        guild_id: &str,
        channel_ids: &[String],
    ) -> Result<Option<Vec<String>>>;

    /// Send a direct message to each candidate and return how many were delivered
    async fn send_direct_message(&self, candidate_ids: &[CandidateId], content: &str)
        -> Result<usize>;

    /// Open a post-match discussion thread and return its id
    async fn create_result_thread(
        &self,
        scrim_id: ScrimId,
        winner: Side,
        team_names: [String; 2],
    ) -> Result<String>;
}

/// Title of the discussion thread for a finished scrim
pub fn result_thread_title(scrim_id: ScrimId, team_names: &[String; 2]) -> String {
    let [blue, red] = team_names;
    format!("Match #{}: {} vs {}", scrim_id, blue, red)
}

/// Opening message of the discussion thread
pub fn result_thread_message(winner: Side, team_names: &[String; 2]) -> String {
    let [blue, red] = team_names;
    let winning_team = match winner {
        Side::Blue => blue,
        Side::Red => red,
    };
    format!(
        "{} won the game.\nRemember to keep it civilized.",
        winning_team
    )
}

/// Gateway that logs every call and tracks channels in memory.
///
/// Used when no chat platform is connected (local runs, simulation).
#[derive(Debug, Default)]
pub struct LoggingChatGateway {
    settings: GatewaySettings,
    /// Active voice channels per guild: (id, name)
    active_voice: Mutex<HashMap<GuildId, Vec<(String, String)>>>,
    sent_messages: Mutex<Vec<(CandidateId, String)>>,
}

impl LoggingChatGateway {
    pub fn new(settings: GatewaySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Ids of voice channels currently open in a guild
    pub fn active_voice_channels(&self, guild_id: &str) -> Vec<String> {
        self.active_voice
            .lock()
            .map(|active| {
                active
                    .get(guild_id)
                    .map(|channels| channels.iter().map(|(id, _)| id.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Messages delivered so far (for testing)
    pub fn sent_messages(&self) -> Vec<(CandidateId, String)> {
        self.sent_messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatGateway for LoggingChatGateway {
    async fn create_team_voice_channels(
        &self,
        guild_id: &str,
        team_names: [String; 2],
    ) -> Result<[String; 2]> {
        let ids = [generate_resource_id(), generate_resource_id()];

        let mut active = self
            .active_voice
            .lock()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire voice channel lock".to_string(),
            })?;
        let channels = active.entry(guild_id.to_string()).or_default();
        for (id, name) in ids.iter().zip(team_names.iter()) {
            channels.push((id.clone(), name.clone()));
        }

        info!(
            "Created voice channels {:?} in guild {} (category: {}, limit: {})",
            team_names,
            guild_id,
            self.settings.voice_category_id.as_deref().unwrap_or("none"),
            VOICE_USER_LIMIT
        );
        Ok(ids)
    }

    async fn delete_voice_channels(
        &self,
        guild_id: &str,
        channel_ids: &[String],
    ) -> Result<Option<Vec<String>>> {
        let mut active = self
            .active_voice
            .lock()
            .map_err(|_| MatchmakingError::InternalError {
                message: "Failed to acquire voice channel lock".to_string(),
            })?;

        let Some(channels) = active.get_mut(guild_id) else {
            return Ok(None);
        };
        if !channels.iter().any(|(id, _)| channel_ids.contains(id)) {
            return Ok(None);
        }

        let mut deleted = Vec::new();
        channels.retain(|(id, name)| {
            if channel_ids.contains(id) {
                deleted.push(name.clone());
                false
            } else {
                true
            }
        });

        info!("Deleted voice channels {:?} in guild {}", deleted, guild_id);
        Ok(Some(deleted))
    }

    async fn send_direct_message(
        &self,
        candidate_ids: &[CandidateId],
        content: &str,
    ) -> Result<usize> {
        let mut messages =
            self.sent_messages
                .lock()
                .map_err(|_| MatchmakingError::InternalError {
                    message: "Failed to acquire sent messages lock".to_string(),
                })?;

        for id in candidate_ids {
            debug!("DM to {}: {}", id, content);
            messages.push((id.clone(), content.to_string()));
        }
        Ok(candidate_ids.len())
    }

    async fn create_result_thread(
        &self,
        scrim_id: ScrimId,
        winner: Side,
        team_names: [String; 2],
    ) -> Result<String> {
        let thread_id = generate_resource_id();
        info!(
            "Opened thread '{}' in channel {}: {}",
            result_thread_title(scrim_id, &team_names),
            self.settings
                .discussion_channel_id
                .as_deref()
                .unwrap_or("none"),
            result_thread_message(winner, &team_names).replace('\n', " ")
        );
        Ok(thread_id)
    }
}

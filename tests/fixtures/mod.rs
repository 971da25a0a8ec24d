//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use scrim_room::config::AppConfig;
use scrim_room::error::{MatchmakingError, Result};
use scrim_room::gateway::{ChatGateway, InMemoryPersistence};
use scrim_room::types::{Candidate, CandidateId, Rank, Region, Role, ScrimId, Side};
use scrim_room::utils::current_timestamp;
use scrim_room::ScrimManager;
use std::sync::{Arc, Mutex};

/// A chat gateway call captured by [`RecordingChatGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCall {
    CreateVoice {
        guild_id: String,
        team_names: [String; 2],
    },
    DeleteVoice {
        guild_id: String,
        channel_ids: Vec<String>,
    },
    DirectMessage {
        recipients: Vec<CandidateId>,
        content: String,
    },
    ResultThread {
        scrim_id: ScrimId,
        winner: Side,
    },
}

/// Chat gateway that records every call and always succeeds
#[derive(Debug, Default)]
pub struct RecordingChatGateway {
    calls: Arc<Mutex<Vec<ChatCall>>>,
}

impl RecordingChatGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Everyone who received a direct message, in delivery order
    pub fn messaged(&self) -> Vec<CandidateId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChatCall::DirectMessage { recipients, .. } => Some(recipients),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&ChatCall) -> bool) -> usize {
        self.calls().into_iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: ChatCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl ChatGateway for RecordingChatGateway {
    async fn create_team_voice_channels(
        &self,
        guild_id: &str,
        team_names: [String; 2],
    ) -> Result<[String; 2]> {
        let ids = [
            format!("voice-{}", team_names[0]),
            format!("voice-{}", team_names[1]),
        ];
        self.record(ChatCall::CreateVoice {
            guild_id: guild_id.to_string(),
            team_names,
        });
        Ok(ids)
    }

    async fn delete_voice_channels(
        &self,
        guild_id: &str,
        channel_ids: &[String],
    ) -> Result<Option<Vec<String>>> {
        self.record(ChatCall::DeleteVoice {
            guild_id: guild_id.to_string(),
            channel_ids: channel_ids.to_vec(),
        });
        Ok(Some(channel_ids.to_vec()))
    }

    async fn send_direct_message(
        &self,
        candidate_ids: &[CandidateId],
        content: &str,
    ) -> Result<usize> {
        self.record(ChatCall::DirectMessage {
            recipients: candidate_ids.to_vec(),
            content: content.to_string(),
        });
        Ok(candidate_ids.len())
    }

    async fn create_result_thread(
        &self,
        scrim_id: ScrimId,
        winner: Side,
        _team_names: [String; 2],
    ) -> Result<String> {
        self.record(ChatCall::ResultThread { scrim_id, winner });
        Ok(format!("thread-{}", scrim_id))
    }
}

/// Chat gateway whose every call fails
#[derive(Debug, Default)]
pub struct FailingChatGateway;

fn chat_down(operation: &str) -> anyhow::Error {
    MatchmakingError::GatewayFailed {
        operation: operation.to_string(),
        message: "chat platform unavailable".to_string(),
    }
    .into()
}

#[async_trait]
impl ChatGateway for FailingChatGateway {
    async fn create_team_voice_channels(
        &self,
        _guild_id: &str,
        _team_names: [String; 2],
    ) -> Result<[String; 2]> {
        Err(chat_down("create_team_voice_channels"))
    }

    async fn delete_voice_channels(
        &self,
        _guild_id: &str,
        _channel_ids: &[String],
    ) -> Result<Option<Vec<String>>> {
        Err(chat_down("delete_voice_channels"))
    }

    async fn send_direct_message(
        &self,
        _candidate_ids: &[CandidateId],
        _content: &str,
    ) -> Result<usize> {
        Err(chat_down("send_direct_message"))
    }

    async fn create_result_thread(
        &self,
        _scrim_id: ScrimId,
        _winner: Side,
        _team_names: [String; 2],
    ) -> Result<String> {
        Err(chat_down("create_result_thread"))
    }
}

pub fn candidate(id: &str, main_role: Role, secondary_role: Role, rating: i32) -> Candidate {
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

/// Two mains per role; the best split differs by 37
pub fn two_per_role() -> Vec<Candidate> {
    vec![
        candidate("huzzle", Role::Top, Role::Mid, 2100),
        candidate("zero", Role::Mid, Role::Top, 1400),
        candidate("rayann", Role::Top, Role::Jungle, 1821),
        candidate("mika", Role::Jungle, Role::Jungle, 2400),
        candidate("mo", Role::Bot, Role::Jungle, 2400),
        candidate("zironic", Role::Support, Role::Bot, 659),
        candidate("kharann", Role::Jungle, Role::Bot, 1700),
        candidate("yyaen", Role::Mid, Role::Bot, 1657),
        candidate("z", Role::Bot, Role::Bot, 1900),
        candidate("tikka", Role::Support, Role::Bot, 1800),
    ]
}

/// Nobody mains SUPPORT; two BOT mains cover it off-role
pub fn no_support_mains() -> Vec<Candidate> {
    vec![
        candidate("t1", Role::Top, Role::Mid, 2100),
        candidate("t2", Role::Top, Role::Jungle, 1800),
        candidate("j1", Role::Jungle, Role::Top, 2000),
        candidate("j2", Role::Jungle, Role::Mid, 1700),
        candidate("m1", Role::Mid, Role::Top, 1900),
        candidate("m2", Role::Mid, Role::Jungle, 1600),
        candidate("b1", Role::Bot, Role::Mid, 2200),
        candidate("b2", Role::Bot, Role::Top, 1500),
        candidate("b3", Role::Bot, Role::Support, 1750),
        candidate("b4", Role::Bot, Role::Support, 1650),
    ]
}

/// Manager over in-memory persistence and the given chat gateway
pub fn test_system(
    config: &AppConfig,
    chat: Arc<dyn ChatGateway>,
) -> (ScrimManager, Arc<InMemoryPersistence>) {
    let persistence = Arc::new(InMemoryPersistence::new());
    let manager = ScrimManager::new(config, persistence.clone(), chat);
    (manager, persistence)
}

/// Register and queue every candidate in order
pub async fn queue_all(
    manager: &ScrimManager,
    key: &scrim_room::types::QueueKey,
    candidates: Vec<Candidate>,
) -> Result<()> {
    for candidate in candidates {
        let candidate = manager.register_candidate(candidate).await?;
        manager.join_queue(candidate, key).await?;
    }
    Ok(())
}

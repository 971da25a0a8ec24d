//! Common types used throughout the matchmaking service

use crate::error::MatchmakingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for candidates (chat platform user id)
pub type CandidateId = String;

/// Unique identifier for guilds (chat platform server id)
pub type GuildId = String;

/// Unique identifier for scrims, assigned by persistence
pub type ScrimId = u64;

/// Number of players on one side of a scrim
pub const TEAM_SIZE: usize = 5;

/// Number of queued candidates needed to form a scrim
pub const MATCH_SIZE: usize = TEAM_SIZE * 2;

/// In-game position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bot,
    Support,
}

impl Role {
    /// All roles in pool order
    pub const ALL: [Role; TEAM_SIZE] = [Role::Top, Role::Jungle, Role::Mid, Role::Bot, Role::Support];

    /// Position of the role's bucket inside a role pool
    pub fn index(self) -> usize {
        match self {
            Role::Top => 0,
            Role::Jungle => 1,
            Role::Mid => 2,
            Role::Bot => 3,
            Role::Support => 4,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Top => write!(f, "TOP"),
            Role::Jungle => write!(f, "JUNGLE"),
            Role::Mid => write!(f, "MID"),
            Role::Bot => write!(f, "BOT"),
            Role::Support => write!(f, "SUPPORT"),
        }
    }
}

impl FromStr for Role {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TOP" => Ok(Role::Top),
            "JUNGLE" => Ok(Role::Jungle),
            "MID" => Ok(Role::Mid),
            "BOT" => Ok(Role::Bot),
            "SUPPORT" => Ok(Role::Support),
            other => Err(MatchmakingError::ConfigurationError {
                message: format!("Unknown role: {}", other),
            }),
        }
    }
}

/// Ranked tier, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rank {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

/// Game server region; every guild keeps one queue per region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Euw,
    Na,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Euw, Region::Na];

    /// Platform code used by third-party stat sites
    pub fn platform_code(self) -> &'static str {
        match self {
            Region::Euw => "euw1",
            Region::Na => "na1",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Euw => write!(f, "EUW"),
            Region::Na => write!(f, "NA"),
        }
    }
}

/// Side of a scrim; team1 of a matchup plays BLUE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Blue => write!(f, "BLUE"),
            Side::Red => write!(f, "RED"),
        }
    }
}

impl FromStr for Side {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BLUE" => Ok(Side::Blue),
            "RED" => Ok(Side::Red),
            _ => Err(MatchmakingError::InvalidSide {
                side: s.to_string(),
            }),
        }
    }
}

/// A participant eligible for matching. The core only ever sees snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    /// In-game name
    pub display_name: String,
    pub region: Region,
    pub rank: Rank,
    pub main_role: Role,
    pub secondary_role: Role,
    pub rating: i32,
    pub external_rating: i32,
    pub wins: u32,
    pub losses: u32,
    /// Protected candidates are placed on their main role first during role assignment
    pub autofill_protected: bool,
    pub registered_at: DateTime<Utc>,
}

/// Key of a queue: one per guild and region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueKey {
    pub guild_id: GuildId,
    pub region: Region,
}

impl QueueKey {
    pub fn new(guild_id: impl Into<GuildId>, region: Region) -> Self {
        Self {
            guild_id: guild_id.into(),
            region,
        }
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.guild_id, self.region)
    }
}

/// Readiness of a queue for match creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchmakingStatus {
    NotEnoughPlayers,
    Ready,
}

/// A candidate bound to a side and role for one scrim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub candidate_id: CandidateId,
    pub display_name: String,
    pub role: Role,
    pub side: Side,
}

/// Scrim lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrimStatus {
    Started,
    Completed,
}

/// A formed match tracked from formation to result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scrim {
    /// Zero until persisted
    pub id: ScrimId,
    pub guild_id: GuildId,
    pub region: Region,
    pub status: ScrimStatus,
    pub players: Vec<Player>,
    pub voice_channel_ids: Vec<String>,
    pub winner: Option<Side>,
    /// Absolute rating difference of the matchup the scrim was formed from
    pub rating_difference: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Scrim {
    /// Players on one side, in role order
    pub fn players_on(&self, side: Side) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.iter().filter(|p| p.side == side).collect();
        players.sort_by_key(|p| p.role);
        players
    }

    pub fn has_player(&self, candidate_id: &str) -> bool {
        self.players.iter().any(|p| p.candidate_id == candidate_id)
    }

    /// Voice channel / thread name for a side
    pub fn team_name(&self, side: Side) -> String {
        match side {
            Side::Blue => format!("Blue #{}", self.id),
            Side::Red => format!("Red #{}", self.id),
        }
    }

    pub fn team_names(&self) -> [String; 2] {
        [self.team_name(Side::Blue), self.team_name(Side::Red)]
    }
}

/// Rating change applied to a player after a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub candidate_id: CandidateId,
    pub side: Side,
    pub delta: i32,
    pub new_rating: i32,
}

/// Outcome of a match creation attempt
#[derive(Debug, Clone)]
pub enum MatchCreation {
    NotEnoughPlayers,
    Formed(Scrim),
}

/// Outcome of a winner report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrimResult {
    pub scrim: Scrim,
    pub rating_changes: Vec<RatingChange>,
    /// Names of the deleted voice channels, if teardown succeeded
    pub deleted_channels: Option<Vec<String>>,
    pub thread_id: Option<String>,
}

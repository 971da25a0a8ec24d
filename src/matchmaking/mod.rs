//! Team allocation for ten queued candidates
//!
//! The pipeline runs role pools → team generation → matchup ranking and picks
//! the split with the smallest rating difference.

pub mod combination;
pub mod pool;
pub mod ranking;
pub mod roles;

// Re-export commonly used types
pub use combination::{generate_teams, Team};
pub use pool::{build_pools, can_form_exact_pools, Pick, RolePool};
pub use ranking::{rank_matchups, Matchup};
pub use roles::{assign_roles, random_team_balance};

use crate::config::MatchmakingSettings;
use crate::error::{MatchmakingError, Result};
use crate::types::{Candidate, Region};
use tracing::debug;

/// Runs the allocation pipeline with a configured off-role penalty
#[derive(Debug, Clone)]
pub struct Matchmaker {
    offrole_penalty: i32,
}

impl Matchmaker {
    pub fn new(offrole_penalty: i32) -> Self {
        Self { offrole_penalty }
    }

    pub fn from_settings(settings: &MatchmakingSettings) -> Self {
        Self::new(settings.offrole_penalty)
    }

    pub fn offrole_penalty(&self) -> i32 {
        self.offrole_penalty
    }

    /// All distinct matchups, best first
    pub fn ranked_matchups(&self, candidates: &[Candidate]) -> Result<Vec<Matchup>> {
        let allow_fill = !can_form_exact_pools(candidates);
        let pool = build_pools(candidates, allow_fill, self.offrole_penalty);
        debug!(
            "Built role pools - secondary_fill: {}, picks: {}, off_role: {}, selections: {}",
            allow_fill,
            pool.len(),
            pool.off_role_picks().count(),
            pool.selection_count()
        );

        let teams = generate_teams(&pool)?;
        let matchups = rank_matchups(&teams, candidates)?;
        debug!(
            "Ranked matchups - teams: {}, distinct splits: {}",
            teams.len(),
            matchups.len()
        );
        Ok(matchups)
    }

    /// The minimum rating-difference matchup
    pub fn matchmake(&self, candidates: &[Candidate]) -> Result<Matchup> {
        self.ranked_matchups(candidates)?
            .into_iter()
            .next()
            .ok_or_else(|| MatchmakingError::NoValidMatchup.into())
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::from_settings(&MatchmakingSettings::default())
    }
}

/// Multi-search link for scouting one team on a stat site
pub fn scouting_link(candidates: &[Candidate], region: Region) -> String {
    let summoners: Vec<&str> = candidates.iter().map(|c| c.display_name.as_str()).collect();
    format!(
        "https://u.gg/multisearch?summoners={}&region={}",
        summoners.join(","),
        region.platform_code()
    )
}

//! Matchup construction, mirror deduplication and rating-balance ranking

use crate::error::{MatchmakingError, Result};
use crate::matchmaking::combination::Team;
use crate::matchmaking::pool::Pick;
use crate::types::{Candidate, MATCH_SIZE, TEAM_SIZE};
use crate::utils::rating_difference;
use std::collections::HashSet;

/// Two disjoint teams covering all ten candidates
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    pub team1: Team,
    pub team2: Team,
    /// Absolute difference between the teams' rating sums
    pub rating_difference: i32,
}

impl Matchup {
    fn new(team1: Team, team2: Team) -> Self {
        let rating_difference = rating_difference(team1.rating_sum(), team2.rating_sum());
        Self {
            team1,
            team2,
            rating_difference,
        }
    }

    /// Whether this pairing is the same split as `other`, from either side
    pub fn mirrors(&self, other: &Matchup) -> bool {
        self.team1.same_members(&other.team1)
            || self.team1.same_members(&other.team2)
            || self.team2.same_members(&other.team1)
            || self.team2.same_members(&other.team2)
    }

    pub fn all_picks(&self) -> impl Iterator<Item = &Pick> {
        self.team1.picks().iter().chain(self.team2.picks())
    }
}

/// Build one matchup per distinct split and sort them by rating difference, best first
pub fn rank_matchups(teams: &[Team], all_candidates: &[Candidate]) -> Result<Vec<Matchup>> {
    check_candidate_set(all_candidates)?;

    let mut ordered: Vec<&Candidate> = all_candidates.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut matchups: Vec<Matchup> = Vec::new();
    for team in teams {
        if team.len() != TEAM_SIZE {
            return Err(MatchmakingError::ComputationInvariant {
                reason: format!("team has {} members, expected {}", team.len(), TEAM_SIZE),
            }
            .into());
        }

        let team = team.clone().canonical();
        let opponents: Vec<Pick> = ordered
            .iter()
            .filter(|candidate| !team.contains(&candidate.id))
            .map(|candidate| Pick::main((*candidate).clone()))
            .collect();

        if opponents.len() != TEAM_SIZE {
            return Err(MatchmakingError::ComputationInvariant {
                reason: format!(
                    "opposing team has {} members, expected {}",
                    opponents.len(),
                    TEAM_SIZE
                ),
            }
            .into());
        }

        let candidate = Matchup::new(team, Team::new(opponents));
        if matchups.iter().any(|accepted| candidate.mirrors(accepted)) {
            continue;
        }
        matchups.push(candidate);
    }

    // Stable: ties keep enumeration order
    matchups.sort_by_key(|m| m.rating_difference);
    Ok(matchups)
}

fn check_candidate_set(all_candidates: &[Candidate]) -> Result<()> {
    if all_candidates.len() != MATCH_SIZE {
        return Err(MatchmakingError::ComputationInvariant {
            reason: format!(
                "matchups need exactly {} candidates, got {}",
                MATCH_SIZE,
                all_candidates.len()
            ),
        }
        .into());
    }

    let ids: HashSet<&str> = all_candidates.iter().map(|c| c.id.as_str()).collect();
    if ids.len() != all_candidates.len() {
        return Err(MatchmakingError::ComputationInvariant {
            reason: "candidate set contains duplicate identities".to_string(),
        }
        .into());
    }

    Ok(())
}

//! Exhaustive team generation over a role pool

use crate::error::{MatchmakingError, Result};
use crate::matchmaking::pool::{Pick, RolePool};
use crate::types::TEAM_SIZE;
use std::collections::HashSet;

/// Upper bound on raw selections; ten candidates never come close
pub const MAX_SELECTIONS: usize = 4096;

/// Five picks with distinct identities
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    picks: Vec<Pick>,
}

impl Team {
    pub(crate) fn new(picks: Vec<Pick>) -> Self {
        Self { picks }
    }

    /// Same team with picks ordered by identity
    pub fn canonical(mut self) -> Self {
        self.picks.sort_by(|a, b| a.candidate.id.cmp(&b.candidate.id));
        self
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn contains(&self, candidate_id: &str) -> bool {
        self.picks.iter().any(|p| p.id() == candidate_id)
    }

    /// Identities in sorted order, for set comparison
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.picks.iter().map(Pick::id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn same_members(&self, other: &Team) -> bool {
        self.sorted_ids() == other.sorted_ids()
    }

    pub fn rating_sum(&self) -> i32 {
        self.picks.iter().map(|p| p.rating).sum()
    }
}

/// Every selection of one pick per bucket whose five identities are distinct
pub fn generate_teams(pool: &RolePool) -> Result<Vec<Team>> {
    let selections = pool.selection_count();
    if selections > MAX_SELECTIONS {
        return Err(MatchmakingError::ComputationInvariant {
            reason: format!(
                "role pool would enumerate {} selections (limit {})",
                selections, MAX_SELECTIONS
            ),
        }
        .into());
    }

    let mut teams = Vec::new();
    let mut selection = Vec::with_capacity(TEAM_SIZE);
    combine(pool.buckets(), &mut selection, &mut teams);
    Ok(teams)
}

fn combine(buckets: &[Vec<Pick>], selection: &mut Vec<Pick>, teams: &mut Vec<Team>) {
    let Some((bucket, rest)) = buckets.split_first() else {
        if has_distinct_identities(selection) {
            teams.push(Team::new(selection.clone()));
        }
        return;
    };

    for pick in bucket {
        selection.push(pick.clone());
        combine(rest, selection, teams);
        selection.pop();
    }
}

fn has_distinct_identities(picks: &[Pick]) -> bool {
    let ids: HashSet<&str> = picks.iter().map(Pick::id).collect();
    ids.len() == picks.len()
}

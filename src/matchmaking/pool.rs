//! Role pool construction
//!
//! Candidates are bucketed by role to form the search space for team
//! generation. When the primary roles don't split evenly, under-populated
//! buckets are back-filled from secondary roles at a penalized rating.

use crate::types::{Candidate, Role, TEAM_SIZE};
use std::collections::HashMap;

/// Minimum bucket size before secondary back-fill kicks in
const TARGET_BUCKET_SIZE: usize = 2;

/// A candidate placed in one role bucket
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub candidate: Candidate,
    /// Role of the bucket the pick sits in
    pub role: Role,
    /// Rating used for balancing; the penalty constant for off-role picks
    pub rating: i32,
    pub off_role: bool,
}

impl Pick {
    /// Pick for the candidate's own main role at their own rating
    pub fn main(candidate: Candidate) -> Self {
        Self {
            role: candidate.main_role,
            rating: candidate.rating,
            off_role: false,
            candidate,
        }
    }

    /// Pick for the candidate's secondary role at the penalty rating
    pub fn secondary(candidate: Candidate, penalty: i32) -> Self {
        Self {
            role: candidate.secondary_role,
            rating: penalty,
            off_role: true,
            candidate,
        }
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// Five role buckets in [`Role::ALL`] order
#[derive(Debug, Clone, Default)]
pub struct RolePool {
    buckets: [Vec<Pick>; TEAM_SIZE],
}

impl RolePool {
    pub fn bucket(&self, role: Role) -> &[Pick] {
        &self.buckets[role.index()]
    }

    pub fn buckets(&self) -> &[Vec<Pick>; TEAM_SIZE] {
        &self.buckets
    }

    /// Number of raw selections the generator would enumerate
    pub fn selection_count(&self) -> usize {
        self.buckets
            .iter()
            .fold(1usize, |acc, bucket| acc.saturating_mul(bucket.len()))
    }

    /// Total number of picks across all buckets
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn off_role_picks(&self) -> impl Iterator<Item = &Pick> {
        self.buckets.iter().flatten().filter(|pick| pick.off_role)
    }

    fn push(&mut self, pick: Pick) {
        self.buckets[pick.role.index()].push(pick);
    }
}

/// Whether the primary roles split into exactly two per role
pub fn can_form_exact_pools(candidates: &[Candidate]) -> bool {
    let mut counts: HashMap<Role, usize> = HashMap::new();
    for candidate in candidates {
        *counts.entry(candidate.main_role).or_default() += 1;
    }

    Role::ALL
        .iter()
        .all(|role| counts.get(role).copied().unwrap_or(0) == TARGET_BUCKET_SIZE)
}

/// Bucket candidates by main role, optionally back-filling short buckets from secondary roles
pub fn build_pools(
    candidates: &[Candidate],
    allow_secondary_fill: bool,
    offrole_penalty: i32,
) -> RolePool {
    let mut pool = RolePool::default();
    for candidate in candidates {
        pool.push(Pick::main(candidate.clone()));
    }

    if allow_secondary_fill {
        // Sizes are fixed before filling so every matching secondary gets in
        let sizes: Vec<usize> = pool.buckets.iter().map(Vec::len).collect();
        for candidate in candidates {
            if sizes[candidate.secondary_role.index()] < TARGET_BUCKET_SIZE {
                pool.push(Pick::secondary(candidate.clone(), offrole_penalty));
            }
        }
    }

    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaking::test_support::candidate;

    #[test]
    fn test_exact_pools_detection() {
        let candidates: Vec<Candidate> = Role::ALL
            .iter()
            .flat_map(|role| {
                vec![
                    candidate(&format!("{}-a", role), *role, Role::Mid, 1500),
                    candidate(&format!("{}-b", role), *role, Role::Mid, 1500),
                ]
            })
            .collect();
        assert!(can_form_exact_pools(&candidates));

        // Eight candidates with four roles doubled is not exact
        assert!(!can_form_exact_pools(&candidates[..8]));
    }

    #[test]
    fn test_primary_placement_only() {
        let candidates = vec![
            candidate("a", Role::Top, Role::Mid, 1500),
            candidate("b", Role::Top, Role::Support, 1400),
            candidate("c", Role::Bot, Role::Support, 1300),
        ];

        let pool = build_pools(&candidates, false, 200);
        assert_eq!(pool.bucket(Role::Top).len(), 2);
        assert_eq!(pool.bucket(Role::Bot).len(), 1);
        assert!(pool.bucket(Role::Support).is_empty());
        assert_eq!(pool.off_role_picks().count(), 0);
        assert_eq!(pool.selection_count(), 0);
    }

    #[test]
    fn test_secondary_fill_uses_penalty() {
        let candidates = vec![
            candidate("a", Role::Top, Role::Mid, 1500),
            candidate("b", Role::Top, Role::Support, 1400),
            candidate("c", Role::Top, Role::Support, 1300),
            candidate("d", Role::Mid, Role::Top, 1700),
            candidate("e", Role::Mid, Role::Top, 1600),
        ];

        let pool = build_pools(&candidates, true, 200);

        // TOP already had three, so nobody is back-filled into it
        assert_eq!(pool.bucket(Role::Top).len(), 3);
        // MID had two, so "a" stays out of it
        assert_eq!(pool.bucket(Role::Mid).len(), 2);

        let support = pool.bucket(Role::Support);
        assert_eq!(support.len(), 2);
        assert!(support.iter().all(|p| p.off_role && p.rating == 200));
        assert_eq!(support[0].id(), "b");

        // Original rating is untouched on the primary pick
        let top_b = pool.bucket(Role::Top).iter().find(|p| p.id() == "b").unwrap();
        assert_eq!(top_b.rating, 1400);
        assert!(!top_b.off_role);
    }

    #[test]
    fn test_fill_uses_sizes_from_before_filling() {
        // Three candidates share JUNGLE as secondary, all get in even though
        // the bucket passes two along the way
        let candidates = vec![
            candidate("a", Role::Mid, Role::Jungle, 1500),
            candidate("b", Role::Mid, Role::Jungle, 1500),
            candidate("c", Role::Mid, Role::Jungle, 1500),
        ];

        let pool = build_pools(&candidates, true, 150);
        assert_eq!(pool.bucket(Role::Jungle).len(), 3);
        assert_eq!(pool.len(), 6);
    }
}

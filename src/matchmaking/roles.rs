//! Turning a matchup into role-assigned players

use crate::error::{MatchmakingError, Result};
use crate::matchmaking::combination::Team;
use crate::matchmaking::ranking::Matchup;
use crate::types::{Candidate, Player, Role, Side, MATCH_SIZE, TEAM_SIZE};
use rand::seq::SliceRandom;
use rand::Rng;

/// Ten players: team1 plays BLUE, team2 plays RED
pub fn assign_roles(matchup: &Matchup) -> Vec<Player> {
    let mut players = bucket_roles(&matchup.team1, Side::Blue);
    players.extend(preferred_roles(&matchup.team2, Side::Red));
    players
}

/// The generated side already holds one pick per role bucket
fn bucket_roles(team: &Team, side: Side) -> Vec<Player> {
    if has_distinct_roles(team) {
        team.picks()
            .iter()
            .map(|pick| Player {
                candidate_id: pick.candidate.id.clone(),
                display_name: pick.candidate.display_name.clone(),
                role: pick.role,
                side,
            })
            .collect()
    } else {
        preferred_roles(team, side)
    }
}

fn has_distinct_roles(team: &Team) -> bool {
    Role::ALL
        .iter()
        .all(|role| team.picks().iter().filter(|p| p.role == *role).count() == 1)
}

/// Main role if free, then secondary, then whatever is left.
/// Autofill-protected candidates choose first.
fn preferred_roles(team: &Team, side: Side) -> Vec<Player> {
    let mut order: Vec<&Candidate> = team.picks().iter().map(|p| &p.candidate).collect();
    order.sort_by_key(|c| !c.autofill_protected);

    let mut taken = [false; TEAM_SIZE];
    let mut assigned: Vec<(&Candidate, Option<Role>)> = Vec::with_capacity(order.len());

    for candidate in order {
        let role = [candidate.main_role, candidate.secondary_role]
            .into_iter()
            .find(|role| !taken[role.index()]);
        if let Some(role) = role {
            taken[role.index()] = true;
        }
        assigned.push((candidate, role));
    }

    assigned
        .into_iter()
        .map(|(candidate, role)| {
            let role = role.unwrap_or_else(|| {
                let free = Role::ALL
                    .into_iter()
                    .find(|r| !taken[r.index()])
                    .unwrap_or(candidate.main_role);
                taken[free.index()] = true;
                free
            });
            Player {
                candidate_id: candidate.id.clone(),
                display_name: candidate.display_name.clone(),
                role,
                side,
            }
        })
        .collect()
}

/// Random split with shuffled roles, ignoring ratings and preferences
pub fn random_team_balance<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rng: &mut R,
) -> Result<Vec<Player>> {
    if candidates.len() != MATCH_SIZE {
        return Err(MatchmakingError::ComputationInvariant {
            reason: format!(
                "random balance needs exactly {} candidates, got {}",
                MATCH_SIZE,
                candidates.len()
            ),
        }
        .into());
    }

    let mut shuffled: Vec<&Candidate> = candidates.iter().collect();
    shuffled.shuffle(rng);

    let mut red_roles = Role::ALL;
    let mut blue_roles = Role::ALL;
    red_roles.shuffle(rng);
    blue_roles.shuffle(rng);

    let players = shuffled
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let (side, role) = if i < TEAM_SIZE {
                (Side::Red, red_roles[i])
            } else {
                (Side::Blue, blue_roles[i - TEAM_SIZE])
            };
            Player {
                candidate_id: candidate.id.clone(),
                display_name: candidate.display_name.clone(),
                role,
                side,
            }
        })
        .collect();

    Ok(players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaking::pool::Pick;
    use crate::matchmaking::test_support::{candidate, two_per_role};
    use crate::matchmaking::Matchmaker;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn roles_on(players: &[Player], side: Side) -> HashSet<Role> {
        players.iter().filter(|p| p.side == side).map(|p| p.role).collect()
    }

    #[test]
    fn test_assigned_roles_are_distinct_per_side() {
        let matchup = Matchmaker::default().matchmake(&two_per_role()).unwrap();
        let players = assign_roles(&matchup);

        assert_eq!(players.len(), MATCH_SIZE);
        assert_eq!(roles_on(&players, Side::Blue).len(), TEAM_SIZE);
        assert_eq!(roles_on(&players, Side::Red).len(), TEAM_SIZE);

        let ids: HashSet<&str> = players.iter().map(|p| p.candidate_id.as_str()).collect();
        assert_eq!(ids.len(), MATCH_SIZE);
    }

    #[test]
    fn test_preferred_roles_fall_back_to_secondary_then_autofill() {
        let team = Team::new(vec![
            Pick::main(candidate("a", Role::Mid, Role::Top, 1500)),
            Pick::main(candidate("b", Role::Mid, Role::Top, 1500)),
            Pick::main(candidate("c", Role::Mid, Role::Top, 1500)),
            Pick::main(candidate("d", Role::Bot, Role::Support, 1500)),
            Pick::main(candidate("e", Role::Bot, Role::Support, 1500)),
        ]);

        let players = preferred_roles(&team, Side::Red);
        let role_of = |id: &str| players.iter().find(|p| p.candidate_id == id).unwrap().role;

        assert_eq!(role_of("a"), Role::Mid);
        assert_eq!(role_of("b"), Role::Top);
        assert_eq!(role_of("c"), Role::Jungle);
        assert_eq!(role_of("d"), Role::Bot);
        assert_eq!(role_of("e"), Role::Support);
    }

    #[test]
    fn test_autofill_protected_chooses_first() {
        let mut protected = candidate("z", Role::Mid, Role::Top, 1500);
        protected.autofill_protected = true;

        let team = Team::new(vec![
            Pick::main(candidate("a", Role::Mid, Role::Top, 1500)),
            Pick::main(candidate("b", Role::Jungle, Role::Top, 1500)),
            Pick::main(candidate("c", Role::Bot, Role::Top, 1500)),
            Pick::main(candidate("d", Role::Support, Role::Top, 1500)),
            Pick::main(protected),
        ]);

        let players = preferred_roles(&team, Side::Blue);
        let role_of = |id: &str| players.iter().find(|p| p.candidate_id == id).unwrap().role;
        assert_eq!(role_of("z"), Role::Mid);
        assert_eq!(role_of("a"), Role::Top);
    }

    #[test]
    fn test_random_balance_splits_five_and_five() {
        let mut rng = StdRng::seed_from_u64(7);
        let players = random_team_balance(&two_per_role(), &mut rng).unwrap();

        assert_eq!(players.len(), MATCH_SIZE);
        assert_eq!(roles_on(&players, Side::Blue).len(), TEAM_SIZE);
        assert_eq!(roles_on(&players, Side::Red).len(), TEAM_SIZE);
    }

    #[test]
    fn test_random_balance_requires_ten() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(random_team_balance(&two_per_role()[..6], &mut rng).is_err());
    }
}

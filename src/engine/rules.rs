//! Pure vote-tally and win-condition functions. No state mutation, no I/O;
//! the phase nodes and graph guards call into here.

use std::collections::BTreeMap;

use crate::model::game_state::Winner;
use crate::model::player::{Player, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliveCounts {
    pub impostors: usize,
    pub good: usize,
}

/// Recompute alive-role counts from the roster itself, never from cached
/// counters.
pub fn alive_counts(players: &[Player]) -> AliveCounts {
    let mut counts = AliveCounts { impostors: 0, good: 0 };
    for player in players.iter().filter(|p| p.is_alive()) {
        match player.role {
            Role::Impostor => counts.impostors += 1,
            Role::Villager | Role::Investigator => counts.good += 1,
        }
    }
    counts
}

/// The shared end-of-game guard, evaluated after night and after execution:
/// the game ends when the impostor is gone or has reached parity.
pub fn game_is_over(players: &[Player]) -> bool {
    let counts = alive_counts(players);
    counts.impostors == 0 || counts.good <= counts.impostors
}

/// Winner for a given set of alive counts. Good-win is checked before the
/// Evil parity rule so the all-dead edge never classifies as Evil. `None`
/// means the counts describe a still-running game, which the graph's guards
/// make unreachable at the win check.
pub fn winner_for_counts(counts: AliveCounts) -> Option<Winner> {
    if counts.impostors == 0 && counts.good > 0 {
        Some(Winner::Good)
    } else if counts.impostors > 0 && counts.good <= counts.impostors {
        Some(Winner::Evil)
    } else if counts.impostors == 0 && counts.good == 0 {
        Some(Winner::Draw)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyOutcome {
    /// A unique plurality leader.
    Execute(String),
    /// Two or more players tied for the strict maximum, sorted by id.
    Tie(Vec<String>),
    NoVotes,
}

/// Count a round's votes and decide the execution outcome. Plurality rules:
/// the single highest count wins regardless of majority.
pub fn tally(votes: &BTreeMap<String, String>) -> (BTreeMap<String, usize>, TallyOutcome) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for target in votes.values() {
        *counts.entry(target.clone()).or_insert(0) += 1;
    }

    let Some(&max_votes) = counts.values().max() else {
        return (counts, TallyOutcome::NoVotes);
    };
    let mut leaders: Vec<String> = counts
        .iter()
        .filter(|(_, &c)| c == max_votes)
        .map(|(id, _)| id.clone())
        .collect();
    let outcome = if leaders.len() == 1 {
        TallyOutcome::Execute(leaders.remove(0))
    } else {
        leaders.sort();
        TallyOutcome::Tie(leaders)
    };
    (counts, outcome)
}

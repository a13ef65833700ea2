use std::collections::{BTreeMap, BTreeSet};

use log::info;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::log::LogEntry;
use crate::model::player::{Player, PlayerStatus, Role};

/// Roster configuration handed to `GameState::initialize`.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Insertion order is the turn order for the whole game.
    pub player_ids: Vec<String>,
    /// Id of the human-controlled seat, if any.
    pub human_player_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("need at least 3 players, got {0}")]
    TooFewPlayers(usize),
    #[error("duplicate player id '{0}' in roster")]
    DuplicatePlayer(String),
    #[error("human player '{0}' is not in the roster")]
    UnknownHuman(String),
}

/// Identifies both the current phase tag and the node the controller runs
/// next. The topology is fixed; see `engine::graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Night,
    ImpAction,
    InvestigatorAction,
    DayAnnounce,
    Discussion,
    Voting,
    Tally,
    Execution,
    NoExecution,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Good,
    Evil,
    Draw,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Good => write!(f, "Good"),
            Winner::Evil => write!(f, "Evil"),
            Winner::Draw => write!(f, "Draw"),
        }
    }
}

/// Outcome of the most recent execution phase, kept for next-day context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastExecuted {
    Executed(String),
    NoExecution(NoExecutionReason),
}

impl std::fmt::Display for LastExecuted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastExecuted::Executed(id) => write!(f, "{id}"),
            LastExecuted::NoExecution(reason) => write!(f, "None ({reason})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoExecutionReason {
    Tie,
    NoVotes,
    NoMajority,
}

impl std::fmt::Display for NoExecutionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoExecutionReason::Tie => write!(f, "tie"),
            NoExecutionReason::NoVotes => write!(f, "no votes"),
            NoExecutionReason::NoMajority => write!(f, "no majority"),
        }
    }
}

/// The single mutable aggregate the whole game runs on. Owned by the
/// controller and mutated in place by one phase node at a time; decision
/// sources only ever see a clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    /// Derived: ids of players with status Alive, in roster order. Kept
    /// consistent after every node.
    pub alive_players: Vec<String>,
    pub phase: Phase,
    /// Increments once per night.
    pub round: u32,
    /// Voter id -> target id for the round in progress; cleared by the tally.
    pub votes: BTreeMap<String, String>,
    /// Last round's votes, retained for discussion context.
    pub previous_round_votes: BTreeMap<String, String>,
    /// The impostor's chosen kill, cleared when the day announcement
    /// processes it.
    pub night_kill_target: Option<String>,
    /// Who died overnight, set once per round by the day announcement.
    pub last_victim: Option<String>,
    pub last_executed: Option<LastExecuted>,
    /// Transient: decided by the tally, consumed by the execution node.
    pub execution_target: Option<String>,
    /// Private night results keyed by recipient id; cleared at night start.
    pub pending_night_results: BTreeMap<String, String>,
    /// Append-only, never truncated.
    pub public_log: Vec<LogEntry>,
    pub game_over: bool,
    pub winner: Option<Winner>,
}

impl GameState {
    /// Build the initial state: validate the roster, shuffle out roles
    /// (always one Impostor; one Investigator from four players up), and
    /// open the log.
    pub fn initialize(config: &GameConfig) -> Result<Self, SetupError> {
        let ids = &config.player_ids;
        if ids.len() < 3 {
            return Err(SetupError::TooFewPlayers(ids.len()));
        }
        let mut seen = BTreeSet::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(SetupError::DuplicatePlayer(id.clone()));
            }
        }
        if let Some(human) = &config.human_player_id {
            if !ids.contains(human) {
                return Err(SetupError::UnknownHuman(human.clone()));
            }
        }

        let investigator_count = usize::from(ids.len() >= 4);
        let mut shuffled: Vec<&String> = ids.iter().collect();
        shuffled.shuffle(&mut rand::thread_rng());
        let impostors: BTreeSet<&str> = shuffled[..1].iter().map(|s| s.as_str()).collect();
        let investigators: BTreeSet<&str> = shuffled[1..1 + investigator_count]
            .iter()
            .map(|s| s.as_str())
            .collect();

        let players: Vec<Player> = ids
            .iter()
            .map(|id| {
                let role = if impostors.contains(id.as_str()) {
                    Role::Impostor
                } else if investigators.contains(id.as_str()) {
                    Role::Investigator
                } else {
                    Role::Villager
                };
                let is_human = config.human_player_id.as_deref() == Some(id.as_str());
                info!("assigned role: id={id} role={role} human={is_human}");
                Player::new(id.clone(), role, is_human)
            })
            .collect();

        Ok(Self {
            alive_players: ids.clone(),
            players,
            phase: Phase::Night,
            round: 0,
            votes: BTreeMap::new(),
            previous_round_votes: BTreeMap::new(),
            night_kill_target: None,
            last_victim: None,
            last_executed: None,
            execution_target: None,
            pending_night_results: BTreeMap::new(),
            public_log: vec![LogEntry::System(format!(
                "Game initialized with players: {}",
                ids.join(", ")
            ))],
            game_over: false,
            winner: None,
        })
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The sole alive player with the given role, if any.
    pub fn alive_with_role(&self, role: Role) -> Option<&Player> {
        self.players.iter().find(|p| p.role == role && p.is_alive())
    }

    /// Alive players other than `actor`, in roster order.
    pub fn alive_targets_excluding(&self, actor: &str) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.is_alive() && p.id != actor)
            .collect()
    }

    /// Flip a player to Dead and drop them from the alive list. Returns
    /// false when the target is missing or already dead.
    pub fn kill(&mut self, id: &str) -> bool {
        let Some(player) = self
            .players
            .iter_mut()
            .find(|p| p.id == id && p.is_alive())
        else {
            return false;
        };
        player.status = PlayerStatus::Dead;
        self.alive_players.retain(|alive| alive != id);
        true
    }

    pub fn log(&mut self, entry: LogEntry) {
        self.public_log.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ids: &[&str], human: Option<&str>) -> GameConfig {
        GameConfig {
            player_ids: ids.iter().map(|s| s.to_string()).collect(),
            human_player_id: human.map(|s| s.to_string()),
        }
    }

    #[test]
    fn initialize_assigns_one_impostor_and_investigator_from_four() {
        let state =
            GameState::initialize(&config(&["Alice", "Bob", "Charlie", "David"], Some("David")))
                .unwrap();
        let imps = state.players.iter().filter(|p| p.role == Role::Impostor).count();
        let invs = state
            .players
            .iter()
            .filter(|p| p.role == Role::Investigator)
            .count();
        assert_eq!(imps, 1);
        assert_eq!(invs, 1);
        assert_eq!(state.alive_players.len(), 4);
        assert!(state.player("David").unwrap().is_human);
        assert_eq!(state.round, 0);
        assert_eq!(state.phase, Phase::Night);
    }

    #[test]
    fn initialize_skips_investigator_with_three_players() {
        let state = GameState::initialize(&config(&["A", "B", "C"], None)).unwrap();
        assert!(state.players.iter().all(|p| p.role != Role::Investigator));
        assert_eq!(
            state.players.iter().filter(|p| p.role == Role::Impostor).count(),
            1
        );
    }

    #[test]
    fn initialize_rejects_bad_rosters() {
        assert!(matches!(
            GameState::initialize(&config(&["A", "B"], None)),
            Err(SetupError::TooFewPlayers(2))
        ));
        assert!(matches!(
            GameState::initialize(&config(&["A", "B", "A"], None)),
            Err(SetupError::DuplicatePlayer(_))
        ));
        assert!(matches!(
            GameState::initialize(&config(&["A", "B", "C"], Some("Zed"))),
            Err(SetupError::UnknownHuman(_))
        ));
    }

    #[test]
    fn kill_is_idempotent_and_keeps_alive_list_consistent() {
        let mut state = GameState::initialize(&config(&["A", "B", "C"], None)).unwrap();
        assert!(state.kill("B"));
        assert!(!state.kill("B"));
        assert!(!state.kill("nobody"));
        assert_eq!(state.alive_players, vec!["A", "C"]);
        let alive_from_players: Vec<&str> = state
            .players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(state.alive_players, alive_from_players);
    }
}

//! The phase graph. The topology is fixed:
//!
//! night -> imp action -> investigator action -> day announce
//!   -> (game over? -> winner) -> discussion -> voting -> tally
//!   -> (execution | no execution) -> (game over? -> winner) -> night
//!
//! The controller owns the state and advances it one node per step. Phase
//! nodes never pick their successor; all routing lives here.

use log::info;

use crate::engine::decision::DecisionSource;
use crate::engine::rules;
use crate::engine::{day, night};
use crate::model::game_state::{GameState, Phase};
use crate::model::log::LogEntry;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no players remain in the roster")]
    MissingRoster,
    #[error("winner requested for a still-running game ({impostors} impostors, {good} good alive)")]
    InconsistentState { impostors: usize, good: usize },
}

pub struct GameController<S: DecisionSource> {
    pub state: GameState,
    decisions: S,
}

impl<S: DecisionSource> GameController<S> {
    pub fn new(state: GameState, decisions: S) -> Self {
        Self { state, decisions }
    }

    /// Run the game to completion and return the final state.
    pub fn run(mut self) -> Result<GameState, EngineError> {
        while !self.state.game_over {
            self.step()?;
        }
        Ok(self.state)
    }

    /// Execute the node for the current phase, then move the cursor.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let phase = self.state.phase;
        info!("phase: {phase:?}");
        match phase {
            Phase::Night => {
                night::start_night(&mut self.state);
                self.state.phase = Phase::ImpAction;
            }
            Phase::ImpAction => {
                night::imp_action(&mut self.state, &mut self.decisions);
                self.state.phase = Phase::InvestigatorAction;
            }
            Phase::InvestigatorAction => {
                night::investigator_action(&mut self.state, &mut self.decisions);
                self.state.phase = Phase::DayAnnounce;
            }
            Phase::DayAnnounce => {
                day::start_day_announce(&mut self.state);
                if rules::game_is_over(&self.state.players) {
                    self.set_winner_end()?;
                } else {
                    self.state.phase = Phase::Discussion;
                }
            }
            Phase::Discussion => {
                day::discussion(&mut self.state, &mut self.decisions);
                self.state.phase = Phase::Voting;
            }
            Phase::Voting => {
                day::voting(&mut self.state, &mut self.decisions);
                self.state.phase = Phase::Tally;
            }
            Phase::Tally => {
                day::tally_votes(&mut self.state);
                self.state.phase = if self.state.execution_target.is_some() {
                    Phase::Execution
                } else {
                    Phase::NoExecution
                };
            }
            Phase::Execution => {
                day::announce_process_execution(&mut self.state);
                self.after_execution_check()?;
            }
            Phase::NoExecution => {
                day::announce_no_execution(&mut self.state);
                self.after_execution_check()?;
            }
            Phase::GameOver => {}
        }
        Ok(())
    }

    fn after_execution_check(&mut self) -> Result<(), EngineError> {
        if rules::game_is_over(&self.state.players) {
            self.set_winner_end()
        } else {
            self.state.phase = Phase::Night;
            Ok(())
        }
    }

    /// Terminal node: classify the winner, reveal all roles, and close the
    /// game.
    fn set_winner_end(&mut self) -> Result<(), EngineError> {
        if self.state.players.is_empty() {
            return Err(EngineError::MissingRoster);
        }
        let counts = rules::alive_counts(&self.state.players);
        let winner =
            rules::winner_for_counts(counts).ok_or(EngineError::InconsistentState {
                impostors: counts.impostors,
                good: counts.good,
            })?;

        self.state.winner = Some(winner);
        self.state.game_over = true;
        self.state.phase = Phase::GameOver;

        println!("\n=== GAME OVER ===");
        println!("The {winner} team wins!");
        self.state.log(LogEntry::System(format!(
            "Game Over. Winner: {winner}."
        )));

        println!("Final roles:");
        let reveals: Vec<String> = self
            .state
            .players
            .iter()
            .map(|p| {
                let status = if p.is_alive() { "alive" } else { "dead" };
                format!("{} ({}, {status})", p.id, p.role)
            })
            .collect();
        for reveal in &reveals {
            println!("  {reveal}");
        }
        self.state.log(LogEntry::System(format!(
            "Final roles: {}.",
            reveals.join(", ")
        )));
        info!("game over: winner={winner}");
        Ok(())
    }
}

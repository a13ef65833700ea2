//! Day phase nodes: the morning announcement, round-robin discussion,
//! private voting, the public tally, and the execution outcomes.

use std::collections::VecDeque;

use log::{error, info, warn};

use crate::engine::arbiter;
use crate::engine::decision::DecisionSource;
use crate::engine::narrator;
use crate::engine::rules::{self, TallyOutcome};
use crate::model::action::{number_options, ActionKind, ActionRequest, Decision};
use crate::model::game_state::{GameState, LastExecuted, NoExecutionReason};
use crate::model::log::LogEntry;

/// Each alive player speaks at most this many times per discussion.
pub const MAX_SPEAKING_TURNS: usize = 2;

/// Process the night's kill and announce the morning. The kill target chosen
/// overnight only takes effect here.
pub fn start_day_announce(state: &mut GameState) {
    let round = state.round;
    let mut victim = None;
    if let Some(target) = state.night_kill_target.take() {
        if state.kill(&target) {
            victim = Some(target);
        } else {
            warn!("night target {target} was not found among alive players");
        }
    }
    state.last_victim = victim.clone();

    println!("\n{}", narrator::day_begins(round));
    let summary = match &victim {
        Some(id) => {
            println!("{}", narrator::death_announcement(id));
            format!("Player {id} was found dead.")
        }
        None => {
            println!("{}", narrator::no_death());
            "No deaths reported overnight.".to_string()
        }
    };
    state.log(LogEntry::Narrator(format!("Day {round}. {summary}")));
}

/// Round-robin discussion: the speaking queue starts in roster order and
/// each speaker re-queues at the back until they hit the turn cap. A failed
/// or empty speech is a skipped turn, never a replayed one.
pub fn discussion(state: &mut GameState, decisions: &mut dyn DecisionSource) {
    let round = state.round;
    state.log(LogEntry::System(format!("Day {round}: Discussion begins.")));
    println!("\nDiscussion begins.");

    let mut queue: VecDeque<String> = state.alive_players.iter().cloned().collect();
    let mut turns_taken: std::collections::BTreeMap<String, usize> =
        std::collections::BTreeMap::new();

    loop {
        let Some(front) = queue.front() else { break };
        if turns_taken.get(front).copied().unwrap_or(0) >= MAX_SPEAKING_TURNS {
            break;
        }
        let Some(speaker) = queue.pop_front() else { break };
        let Some(player) = state.player(&speaker) else {
            error!("speaker {speaker} missing from roster; skipping turn");
            continue;
        };
        let (role, is_human) = (player.role, player.is_human);
        info!(
            "discussion turn: {speaker} ({}/{MAX_SPEAKING_TURNS})",
            turns_taken.get(&speaker).copied().unwrap_or(0) + 1
        );

        let request = ActionRequest {
            kind: ActionKind::Speak,
            player_id: speaker.clone(),
            role,
            is_human,
            options: Default::default(),
            prompt: format!(
                "{speaker}, it's your turn to speak. Consider the discussion so far."
            ),
            state: state.clone(),
        };

        match decisions.decide(&request) {
            Decision::Speech(speech) if speech.content.trim().is_empty() => {
                println!("{speaker} remains silent.");
                state.log(LogEntry::System(format!("{speaker} remains silent.")));
            }
            Decision::Speech(speech) => {
                let target_note = speech
                    .target
                    .as_deref()
                    .map(|t| format!(", Target: {t}"))
                    .unwrap_or_default();
                println!(
                    "{speaker}: \"{}\" (Intent: {}{target_note})",
                    speech.content, speech.intent
                );
                state.log(LogEntry::Speech {
                    speaker: speaker.clone(),
                    speech,
                });
            }
            Decision::Key(key) => {
                warn!("{speaker} returned a key '{key}' for a speak request");
                println!("{speaker} remains silent.");
                state.log(LogEntry::System(format!("{speaker} remains silent.")));
            }
            Decision::Failure(failure) => {
                let ruling = arbiter::handle_decision_failure(&failure);
                arbiter::apply_ruling(state, &ruling);
            }
        }

        let taken = turns_taken.entry(speaker.clone()).or_insert(0);
        *taken += 1;
        if *taken < MAX_SPEAKING_TURNS {
            queue.push_back(speaker);
        }
    }

    state.log(LogEntry::System(format!(
        "Discussion concluded (Round {round})."
    )));
    println!("Discussion concluded.");
}

/// Every alive player votes in roster order. Until the tally, the public log
/// only says who voted or abstained, never for whom.
pub fn voting(state: &mut GameState, decisions: &mut dyn DecisionSource) {
    let round = state.round;
    state.log(LogEntry::System(format!(
        "Day {round}: Voting begins. Votes are cast privately."
    )));
    println!("\nVoting begins. Votes are cast privately.");

    let mut votes = std::collections::BTreeMap::new();
    let voters = state.alive_players.clone();
    for voter in voters {
        let Some(player) = state.player(&voter) else {
            warn!("voter {voter} missing from roster; skipping");
            continue;
        };
        let (role, is_human) = (player.role, player.is_human);

        let targets: Vec<String> = state
            .alive_players
            .iter()
            .filter(|id| **id != voter)
            .cloned()
            .collect();
        if targets.is_empty() {
            state.log(LogEntry::Vote(format!(
                "{voter} abstains (no valid targets)."
            )));
            continue;
        }

        let options = number_options(targets);
        let request = ActionRequest {
            kind: ActionKind::Vote,
            player_id: voter.clone(),
            role,
            is_human,
            options,
            prompt: format!("{voter}, choose who to vote for execution:"),
            state: state.clone(),
        };
        let decision = decisions.decide(&request);

        match arbiter::resolve_selection(state, decision, &request) {
            Some(key) => {
                if let Some(target) = request.options.get(&key) {
                    info!("{voter} voted for {target} (secret until tally)");
                    votes.insert(voter.clone(), target.clone());
                    state.log(LogEntry::Vote(format!("{voter} has cast their vote.")));
                    println!("{voter} voted.");
                }
            }
            None => {
                state.log(LogEntry::Vote(format!("{voter} abstained.")));
                println!("{voter} abstained.");
            }
        }
    }

    state.votes = votes;
    state.log(LogEntry::System("Voting concluded.".to_string()));
    println!("Voting concluded.");
}

/// Reveal the ballots, count them, and decide the execution outcome. This is
/// the moment individual votes become public.
pub fn tally_votes(state: &mut GameState) {
    state.previous_round_votes = state.votes.clone();

    for (voter, target) in &state.votes.clone() {
        state.log(LogEntry::Vote(format!("{voter} voted for {target}")));
    }

    let (counts, outcome) = rules::tally(&state.votes);
    println!("\n{}", narrator::vote_results(&counts, &outcome));

    let summary = match &outcome {
        TallyOutcome::Execute(target) => {
            state.execution_target = Some(target.clone());
            state.last_executed = None;
            format!("Execution target: {target}.")
        }
        TallyOutcome::Tie(tied) => {
            state.execution_target = None;
            state.last_executed = Some(LastExecuted::NoExecution(NoExecutionReason::Tie));
            format!("Vote tied between {}.", tied.join(", "))
        }
        TallyOutcome::NoVotes => {
            state.execution_target = None;
            state.last_executed = Some(LastExecuted::NoExecution(NoExecutionReason::NoVotes));
            "No votes cast.".to_string()
        }
    };
    state.log(LogEntry::Narrator(format!("Vote Results - {summary}")));
    state.votes.clear();
    info!("tally complete: {summary}");
}

/// Carry out the execution decided by the tally.
pub fn announce_process_execution(state: &mut GameState) {
    let Some(target) = state.execution_target.take() else {
        // The controller only routes here with a target set.
        error!("execution node reached without a target");
        state.log(LogEntry::System(
            "ERROR - Execution phase reached without a target.".to_string(),
        ));
        return;
    };

    println!("\n{}", narrator::execution(&target));
    if state.kill(&target) {
        state.last_executed = Some(LastExecuted::Executed(target.clone()));
        state.log(LogEntry::Narrator(format!(
            "Player {target} was executed by vote."
        )));
    } else {
        warn!("attempted to execute {target}, but they could not be processed");
        state.log(LogEntry::System(format!(
            "Attempted execution of {target} failed (player not found or already dead)."
        )));
    }
}

/// Confirm that nobody is executed this round. The detailed reasoning was
/// already announced by the tally.
pub fn announce_no_execution(state: &mut GameState) {
    state.execution_target = None;
    let reason = match &state.last_executed {
        Some(LastExecuted::NoExecution(reason)) => *reason,
        _ => NoExecutionReason::NoMajority,
    };
    info!("no execution this round ({reason})");
    state.log(LogEntry::Narrator(format!(
        "No execution occurred due to {reason}."
    )));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{key_for, ScriptedSource};
    use crate::model::action::{DecisionFailure, FailureKind, Speech};
    use crate::model::game_state::{GameConfig, GameState};
    use crate::model::player::Role;

    fn state_with_roles(roles: &[(&str, Role)]) -> GameState {
        let mut state = GameState::initialize(&GameConfig {
            player_ids: roles.iter().map(|(id, _)| id.to_string()).collect(),
            human_player_id: None,
        })
        .unwrap();
        for (id, role) in roles {
            if let Some(p) = state.players.iter_mut().find(|p| p.id == *id) {
                p.role = *role;
            }
        }
        state
    }

    fn four_player_state() -> GameState {
        state_with_roles(&[
            ("Alice", Role::Impostor),
            ("Bob", Role::Villager),
            ("Charlie", Role::Villager),
            ("David", Role::Investigator),
        ])
    }

    #[test]
    fn day_announce_applies_the_night_kill() {
        let mut state = four_player_state();
        state.round = 1;
        state.night_kill_target = Some("Bob".into());

        start_day_announce(&mut state);
        assert!(!state.player("Bob").unwrap().is_alive());
        assert_eq!(state.last_victim.as_deref(), Some("Bob"));
        assert!(state.night_kill_target.is_none());
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("Bob was found dead")));
    }

    #[test]
    fn quiet_night_announces_no_deaths() {
        let mut state = four_player_state();
        state.round = 1;
        start_day_announce(&mut state);
        assert!(state.last_victim.is_none());
        assert_eq!(state.alive_players.len(), 4);
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("No deaths reported overnight")));
    }

    #[test]
    fn discussion_gives_each_speaker_exactly_two_turns() {
        let mut state = four_player_state();
        let mut spoken: Vec<String> = Vec::new();
        let mut source = ScriptedSource::new(|req| {
            Decision::Speech(Speech::plain(format!("statement from {}", req.player_id)))
        });
        discussion(&mut state, &mut source);

        for entry in &state.public_log {
            if let LogEntry::Speech { speaker, .. } = entry {
                spoken.push(speaker.clone());
            }
        }
        assert_eq!(spoken.len(), 8);
        // Round-robin: the full roster cycles before anyone speaks again.
        assert_eq!(&spoken[..4], &["Alice", "Bob", "Charlie", "David"]);
        assert_eq!(&spoken[4..], &["Alice", "Bob", "Charlie", "David"]);
    }

    #[test]
    fn empty_speech_is_logged_as_silence_without_gm() {
        let mut state = four_player_state();
        let mut source = ScriptedSource::new(|req| {
            if req.player_id == "Bob" {
                Decision::Speech(Speech::plain(""))
            } else {
                Decision::Speech(Speech::plain("something"))
            }
        });
        discussion(&mut state, &mut source);
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("Bob remains silent")));
        assert!(!state
            .public_log
            .iter()
            .any(|e| matches!(e, LogEntry::Gm(_))));
    }

    #[test]
    fn failed_speech_draws_a_gm_line_and_the_turn_moves_on() {
        let mut state = four_player_state();
        let mut source = ScriptedSource::new(|req| {
            if req.player_id == "Charlie" {
                Decision::Failure(DecisionFailure::from_request(
                    FailureKind::CallFailed,
                    req,
                ))
            } else {
                Decision::Speech(Speech::plain("something"))
            }
        });
        discussion(&mut state, &mut source);
        assert!(state
            .public_log
            .iter()
            .any(|e| matches!(e, LogEntry::Gm(text) if text.contains("Charlie"))));
    }

    #[test]
    fn votes_stay_secret_until_the_tally() {
        let mut state = four_player_state();
        let mut source = ScriptedSource::new(|req| key_for(req, "Alice"));
        voting(&mut state, &mut source);

        assert_eq!(state.votes.len(), 4);
        for entry in &state.public_log {
            let line = entry.context_line();
            assert!(!line.contains("voted for"), "ballot leaked early: {line}");
        }

        tally_votes(&mut state);
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("voted for")));
    }

    #[test]
    fn tally_executes_the_plurality_leader_and_snapshots_votes() {
        let mut state = four_player_state();
        state.votes = [
            ("Alice".to_string(), "Bob".to_string()),
            ("Bob".to_string(), "Alice".to_string()),
            ("Charlie".to_string(), "Alice".to_string()),
            ("David".to_string(), "Alice".to_string()),
        ]
        .into();

        tally_votes(&mut state);
        assert_eq!(state.execution_target.as_deref(), Some("Alice"));
        assert!(state.votes.is_empty());
        assert_eq!(state.previous_round_votes.len(), 4);
        assert!(state.last_executed.is_none());
    }

    #[test]
    fn tied_tally_blocks_execution() {
        let mut state = four_player_state();
        state.votes = [
            ("Alice".to_string(), "Bob".to_string()),
            ("Bob".to_string(), "Alice".to_string()),
        ]
        .into();

        tally_votes(&mut state);
        assert!(state.execution_target.is_none());
        assert_eq!(
            state.last_executed,
            Some(LastExecuted::NoExecution(NoExecutionReason::Tie))
        );

        announce_no_execution(&mut state);
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("No execution occurred due to tie")));
    }

    #[test]
    fn execution_kills_the_target_and_records_it() {
        let mut state = four_player_state();
        state.execution_target = Some("Alice".into());

        announce_process_execution(&mut state);
        assert!(!state.player("Alice").unwrap().is_alive());
        assert_eq!(
            state.last_executed,
            Some(LastExecuted::Executed("Alice".into()))
        );
        assert!(state.execution_target.is_none());
    }

    #[test]
    fn abstaining_voter_is_logged_without_a_ballot() {
        let mut state = four_player_state();
        let mut source = ScriptedSource::new(|req| {
            if req.player_id == "David" {
                Decision::Failure(DecisionFailure::from_request(
                    FailureKind::CallFailed,
                    req,
                ))
            } else {
                key_for(req, "Alice")
            }
        });
        voting(&mut state, &mut source);
        assert_eq!(state.votes.len(), 3);
        assert!(!state.votes.contains_key("David"));
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("David abstained")));
    }
}

//! Night phase nodes: round start, the impostor's kill, and the
//! investigator's examination. Each node mutates the state in place; the
//! controller decides what runs next.

use log::{info, warn};

use crate::engine::arbiter;
use crate::engine::decision::DecisionSource;
use crate::engine::narrator;
use crate::model::action::{number_options, ActionKind, ActionRequest};
use crate::model::game_state::GameState;
use crate::model::log::LogEntry;
use crate::model::player::{Alignment, Role};

/// Open a new round: bump the counter, clear per-night fields, narrate.
pub fn start_night(state: &mut GameState) {
    state.round += 1;
    state.last_victim = None;
    state.pending_night_results.clear();
    info!("round {} night begins", state.round);

    println!("\n{}", narrator::night_begins(state.round));
    state.log(LogEntry::System(format!(
        "Round {}: Night phase begins.",
        state.round
    )));
}

/// The impostor picks tonight's victim. The choice lands in
/// `night_kill_target`; nobody dies until the day announcement processes it.
pub fn imp_action(state: &mut GameState, decisions: &mut dyn DecisionSource) {
    state.night_kill_target = None;
    let round = state.round;

    let Some(imp) = state.alive_with_role(Role::Impostor) else {
        warn!("night {round}: no alive impostor to act");
        state.log(LogEntry::System(format!(
            "Night {round}: Error - No alive Impostor for action."
        )));
        return;
    };
    let imp_id = imp.id.clone();
    let is_human = imp.is_human;

    let targets: Vec<String> = state
        .alive_targets_excluding(&imp_id)
        .iter()
        .map(|p| p.id.clone())
        .collect();
    if targets.is_empty() {
        state.log(LogEntry::System(format!(
            "Night {round}: Impostor ({imp_id}) finds no valid targets."
        )));
        return;
    }

    let options = number_options(targets);
    let request = ActionRequest {
        kind: ActionKind::ImpKill,
        player_id: imp_id.clone(),
        role: Role::Impostor,
        is_human,
        options,
        prompt: format!("Impostor '{imp_id}', choose a target to eliminate."),
        state: state.clone(),
    };
    let decision = decisions.decide(&request);

    match arbiter::resolve_selection(state, decision, &request) {
        Some(key) => {
            if let Some(target) = request.options.get(&key) {
                info!("impostor {imp_id} targets {target}");
                state.night_kill_target = Some(target.clone());
                state.log(LogEntry::System(format!("Night {round}: A shadow moves...")));
            }
        }
        None => {
            info!("impostor {imp_id} action resolved to no target");
            state.log(LogEntry::System(format!(
                "Night {round}: The Impostor's action resulted in no target."
            )));
        }
    }
}

/// The investigator examines one player and learns their alignment. The
/// result is private: it goes into `pending_night_results` for the prompt
/// builder, and is printed directly only for a human investigator. The
/// public log gets a deliberately vague line.
pub fn investigator_action(state: &mut GameState, decisions: &mut dyn DecisionSource) {
    let round = state.round;
    let Some(investigator) = state.alive_with_role(Role::Investigator) else {
        info!("night {round}: no alive investigator");
        return;
    };
    let investigator_id = investigator.id.clone();
    let is_human = investigator.is_human;

    let targets: Vec<String> = state
        .alive_targets_excluding(&investigator_id)
        .iter()
        .map(|p| p.id.clone())
        .collect();
    let had_targets = !targets.is_empty();

    if had_targets {
        let options = number_options(targets);
        let request = ActionRequest {
            kind: ActionKind::Investigate,
            player_id: investigator_id.clone(),
            role: Role::Investigator,
            is_human,
            options,
            prompt: format!(
                "Investigator '{investigator_id}', choose a player to investigate."
            ),
            state: state.clone(),
        };
        let decision = decisions.decide(&request);

        if let Some(key) = arbiter::resolve_selection(state, decision, &request) {
            if let Some(target_id) = request.options.get(&key) {
                let alignment = state
                    .player(target_id)
                    .map(|p| p.alignment())
                    .unwrap_or(Alignment::Good);
                let result = format!(
                    "Your investigation revealed Player {target_id} is associated with the {alignment} team."
                );
                info!("investigation: {investigator_id} -> {target_id} ({alignment})");
                state
                    .pending_night_results
                    .insert(investigator_id.clone(), result);
            }
        }
    } else {
        state.log(LogEntry::System(format!(
            "Night {round}: Investigator ({investigator_id}) finds no valid targets."
        )));
    }

    // The investigator always wakes up with some message, even after a
    // forfeited or impossible action.
    state
        .pending_night_results
        .entry(investigator_id.clone())
        .or_insert_with(|| {
            "You did not receive an investigation result this night due to unclear \
instructions or failure to act."
                .to_string()
        });

    if is_human {
        if let Some(result) = state.pending_night_results.get(&investigator_id) {
            println!("\nGM (Private): {result}");
        }
    }

    if had_targets {
        state.log(LogEntry::System(format!(
            "Night {round}: Eyes watch in the darkness..."
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::ScriptedSource;
    use crate::model::action::Decision;
    use crate::model::game_state::{GameConfig, GameState};
    use crate::model::player::PlayerStatus;

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

    #[test]
    fn start_night_resets_per_night_fields() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Villager),
            ("C", Role::Investigator),
        ]);
        state.last_victim = Some("B".into());
        state.pending_night_results.insert("C".into(), "old".into());

        start_night(&mut state);
        assert_eq!(state.round, 1);
        assert!(state.last_victim.is_none());
        assert!(state.pending_night_results.is_empty());
    }

    #[test]
    fn imp_action_records_the_chosen_target_without_killing() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Villager),
            ("C", Role::Villager),
        ]);
        // Options for A are B=1, C=2.
        let mut source = ScriptedSource::new(|_req| Decision::Key("2".into()));
        imp_action(&mut state, &mut source);
        assert_eq!(state.night_kill_target.as_deref(), Some("C"));
        assert!(state.player("C").unwrap().is_alive());
    }

    #[test]
    fn failed_imp_action_leaves_no_target() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Villager),
            ("C", Role::Villager),
        ]);
        let mut source = ScriptedSource::new(|req| {
            Decision::Failure(crate::model::action::DecisionFailure::from_request(
                crate::model::action::FailureKind::ParseFailed,
                req,
            ))
        });
        imp_action(&mut state, &mut source);
        assert!(state.night_kill_target.is_none());
    }

    #[test]
    fn investigation_result_stays_out_of_the_public_log() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Villager),
            ("C", Role::Investigator),
        ]);
        let mut source = ScriptedSource::new(|_req| Decision::Key("1".into()));
        investigator_action(&mut state, &mut source);

        let result = state.pending_night_results.get("C").unwrap();
        assert!(result.contains("Evil") || result.contains("Good"));
        for entry in &state.public_log {
            let line = entry.context_line();
            assert!(!line.contains("Evil"), "alignment leaked: {line}");
            assert!(!line.contains("investigation revealed"), "leaked: {line}");
        }
        assert!(state
            .public_log
            .iter()
            .any(|e| e.context_line().contains("Eyes watch in the darkness")));
    }

    #[test]
    fn investigating_the_impostor_reports_evil() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Investigator),
            ("C", Role::Villager),
        ]);
        // Options for B are A=1, C=2.
        let mut source = ScriptedSource::new(|_req| Decision::Key("1".into()));
        investigator_action(&mut state, &mut source);
        assert!(state
            .pending_night_results
            .get("B")
            .unwrap()
            .contains("Evil"));
    }

    #[test]
    fn failed_investigation_still_leaves_a_private_message() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Investigator),
            ("C", Role::Villager),
        ]);
        let mut source = ScriptedSource::new(|req| {
            Decision::Failure(crate::model::action::DecisionFailure::from_request(
                crate::model::action::FailureKind::CallFailed,
                req,
            ))
        });
        investigator_action(&mut state, &mut source);
        assert!(state.pending_night_results.contains_key("B"));
    }

    #[test]
    fn dead_investigator_does_not_act() {
        let mut state = state_with_roles(&[
            ("A", Role::Impostor),
            ("B", Role::Investigator),
            ("C", Role::Villager),
        ]);
        state.kill("B");
        let mut source = ScriptedSource::new(|_req| {
            panic!("no decision should be requested");
        });
        investigator_action(&mut state, &mut source);
        assert!(state.pending_night_results.is_empty());
        let _ = state.player("B").map(|p| assert_eq!(p.status, PlayerStatus::Dead));
    }
}

//! Failure recovery for unresolved decisions. The arbiter gets exactly one
//! non-interactive attempt: reinterpret the text the strict parser rejected,
//! and if no valid key can be extracted, narrate the loss of the turn.

use log::{error, info, warn};

use crate::engine::narrator::{self, GmFailureClass};
use crate::engine::parser;
use crate::model::action::{ActionKind, ActionRequest, Decision, DecisionFailure, FailureKind};
use crate::model::game_state::GameState;
use crate::model::log::LogEntry;

/// Private message stored for an investigator whose choice never resolved.
pub const NO_RESULT_MESSAGE: &str =
    "You did not receive an investigation result this night due to an unclear choice.";

/// Outcome of one arbitration, to be applied to the state by the caller.
#[derive(Debug, Clone)]
pub struct Ruling {
    /// A key salvaged from the rejected text, valid against the original
    /// option set.
    pub recovered_key: Option<String>,
    pub logs: Vec<LogEntry>,
    /// Private night result to record, keyed by recipient id.
    pub pending_result: Option<(String, String)>,
}

/// Arbitrate a decision failure.
///
/// Recovery is attempted only for parse and validation failures on selection
/// actions with a non-empty option set and some surviving text; a call that
/// produced nothing leaves nothing to reinterpret. The permissive scan
/// accepts the first option key found anywhere in the cleaned output.
pub fn handle_decision_failure(failure: &DecisionFailure) -> Ruling {
    error!(
        "arbitrating failure: player={} action={} kind={} raw={:?}",
        failure.player_id, failure.action, failure.kind, failure.raw
    );

    let cleaned = failure
        .cleaned
        .clone()
        .or_else(|| failure.raw.clone())
        .unwrap_or_default();
    let can_interpret = matches!(
        failure.kind,
        FailureKind::ParseFailed | FailureKind::ValidationError
    ) && failure.action.is_selection()
        && !failure.options.is_empty()
        && !cleaned.is_empty();

    if can_interpret {
        info!(
            "attempting reinterpretation for {}'s {}",
            failure.player_id, failure.action
        );
        if let Some(key) = parser::first_key_occurrence(&cleaned, &failure.options) {
            info!("reinterpretation succeeded: key '{key}'");
            return Ruling {
                logs: vec![LogEntry::Gm(format!(
                    "Interpreted {}'s ambiguous {} response as option {}. Action recovered.",
                    failure.player_id, failure.action, key
                ))],
                recovered_key: Some(key),
                pending_result: None,
            };
        }
        warn!("reinterpretation found no valid key in '{cleaned}'");
    }

    let class = if can_interpret {
        GmFailureClass::Unrecoverable
    } else if failure.kind == FailureKind::CallFailed {
        GmFailureClass::CallFailure
    } else {
        GmFailureClass::ParseFailure
    };
    let mut logs = vec![
        LogEntry::Gm(narrator::gm_intervention(
            &failure.player_id,
            failure.action.label(),
            class,
        )),
        LogEntry::System(format!(
            "Player {}'s {} action ultimately failed ({}).",
            failure.player_id, failure.action, failure.kind
        )),
    ];
    let pending_result = if failure.action == ActionKind::Investigate {
        logs.push(LogEntry::System(format!(
            "A fallback night result was recorded for {}.",
            failure.player_id
        )));
        Some((failure.player_id.clone(), NO_RESULT_MESSAGE.to_string()))
    } else {
        None
    };

    Ruling {
        recovered_key: None,
        logs,
        pending_result,
    }
}

/// Reduce a selection decision to a validated option key, arbitrating on
/// failure and applying the ruling's side effects to the state. `None` means
/// the action is forfeited for this turn.
pub fn resolve_selection(
    state: &mut GameState,
    decision: Decision,
    request: &ActionRequest,
) -> Option<String> {
    let failure = match decision {
        Decision::Key(key) if request.options.contains_key(&key) => return Some(key),
        Decision::Key(key) => {
            warn!(
                "source returned key '{key}' outside the option set for {}",
                request.player_id
            );
            DecisionFailure::from_request(FailureKind::ValidationError, request)
                .with_output(key.clone(), key)
        }
        Decision::Speech(_) => {
            warn!(
                "source returned a speech for a {} request from {}",
                request.kind, request.player_id
            );
            DecisionFailure::from_request(FailureKind::Unexpected, request)
        }
        Decision::Failure(failure) => failure,
    };

    let ruling = handle_decision_failure(&failure);
    apply_ruling(state, &ruling);
    ruling.recovered_key
}

pub fn apply_ruling(state: &mut GameState, ruling: &Ruling) {
    for entry in &ruling.logs {
        state.log(entry.clone());
    }
    if let Some((player_id, message)) = &ruling.pending_result {
        state
            .pending_night_results
            .insert(player_id.clone(), message.clone());
    }
}

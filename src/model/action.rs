use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::game_state::GameState;
use crate::model::player::Role;

pub const DEFAULT_INTENT: &str = "general_statement";
pub const DEFAULT_TONE: &str = "neutral";

/// The kinds of decision the engine can solicit from an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Speak,
    Vote,
    ImpKill,
    Investigate,
}

impl ActionKind {
    /// Selection kinds resolve to one key out of an enumerated option set.
    pub fn is_selection(self) -> bool {
        matches!(self, ActionKind::Vote | ActionKind::ImpKill | ActionKind::Investigate)
    }

    /// Secret actions are resolved without any public console echo.
    pub fn is_secret(self) -> bool {
        matches!(self, ActionKind::ImpKill | ActionKind::Investigate)
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Speak => "speak",
            ActionKind::Vote => "vote",
            ActionKind::ImpKill => "kill",
            ActionKind::Investigate => "investigate",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One structured discussion statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speech {
    pub content: String,
    pub intent: String,
    pub target: Option<String>,
    pub tone: String,
}

impl Speech {
    /// Wrap bare text (e.g. human console input) with default annotations.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            intent: DEFAULT_INTENT.to_string(),
            target: None,
            tone: DEFAULT_TONE.to_string(),
        }
    }
}

/// Everything a decision source needs to resolve one action. Built fresh per
/// decision; `state` is a snapshot, so an in-flight decision never observes
/// log entries appended after the request was issued.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub player_id: String,
    pub role: Role,
    pub is_human: bool,
    /// Option key -> target player id. Empty for `Speak`.
    pub options: BTreeMap<String, String>,
    pub prompt: String,
    pub state: GameState,
}

/// Enumerate target ids as 1-based string keys, in the given order.
pub fn number_options<I, S>(targets: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    targets
        .into_iter()
        .enumerate()
        .map(|(i, id)| ((i + 1).to_string(), id.into()))
        .collect()
}

/// What one decision resolved to, before the phase node applies it.
#[derive(Debug, Clone)]
pub enum Decision {
    /// A validated option key (selection actions).
    Key(String),
    /// A validated speech record (`Speak`).
    Speech(Speech),
    /// The decision could not be resolved; the arbiter takes over.
    Failure(DecisionFailure),
}

/// Classified failure descriptor handed to the recovery arbiter.
#[derive(Debug, Clone)]
pub struct DecisionFailure {
    pub kind: FailureKind,
    pub player_id: String,
    pub action: ActionKind,
    /// Output as received, if any was received at all.
    pub raw: Option<String>,
    /// The cleaned form the parser worked on.
    pub cleaned: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl DecisionFailure {
    pub fn from_request(kind: FailureKind, request: &ActionRequest) -> Self {
        Self {
            kind,
            player_id: request.player_id.clone(),
            action: request.kind,
            raw: None,
            cleaned: None,
            options: request.options.clone(),
        }
    }

    pub fn with_output(mut self, raw: impl Into<String>, cleaned: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self.cleaned = Some(cleaned.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FailureKind {
    /// The decision source produced no output (timeout, transport error,
    /// cancelled console read).
    #[error("call failed")]
    CallFailed,
    /// Output received but not reducible to a valid action.
    #[error("parsing failed")]
    ParseFailed,
    /// Output nominally well-formed but rejected by a content check.
    #[error("validation error")]
    ValidationError,
    /// Any other fault surfaced while requesting or interpreting a decision.
    #[error("unexpected fault")]
    Unexpected,
}

use serde::{Deserialize, Serialize};

use crate::model::action::Speech;

/// A single entry in the public game log. The log is append-only: entries are
/// never edited or removed once pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogEntry {
    /// System bookkeeping ("Round 2: Night phase begins.").
    System(String),
    /// Flavour text produced by the narrator.
    Narrator(String),
    /// A Game Master intervention line.
    Gm(String),
    /// Vote bookkeeping. Targets are never named here before the tally.
    Vote(String),
    /// A structured discussion statement.
    Speech { speaker: String, speech: Speech },
}

impl LogEntry {
    /// The entry without its channel prefix, as fed back into decision
    /// context. Speech entries render with their intent/target annotations.
    pub fn context_line(&self) -> String {
        match self {
            LogEntry::System(text)
            | LogEntry::Narrator(text)
            | LogEntry::Vote(text) => text.clone(),
            LogEntry::Gm(text) => format!("GM: {text}"),
            LogEntry::Speech { speaker, speech } => {
                let mut line = speaker.clone();
                line.push_str(&format!(" [{}]", speech.intent));
                if let Some(target) = &speech.target {
                    line.push_str(&format!(" (-> {target})"));
                }
                line.push_str(&format!(": \"{}\"", speech.content));
                line
            }
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEntry::System(text) => write!(f, "SYS: {text}"),
            LogEntry::Narrator(text) => write!(f, "NARRATOR: {text}"),
            LogEntry::Gm(text) => write!(f, "GM: {text}"),
            LogEntry::Vote(text) => write!(f, "VOTE: {text}"),
            LogEntry::Speech { .. } => write!(f, "{}", self.context_line()),
        }
    }
}

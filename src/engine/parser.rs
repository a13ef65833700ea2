//! Strict decision parser: raw actor output in, validated action value out.
//!
//! The contract is deliberately conservative: under any ambiguity the parser
//! returns `None` and lets the arbiter decide whether a best-effort rescue is
//! warranted. It never panics and never guesses.

use std::collections::BTreeMap;

use log::{debug, warn};
use regex::Regex;

use crate::model::action::{ActionKind, Speech, DEFAULT_INTENT, DEFAULT_TONE};

/// Filler preambles chat models like to prepend before the actual answer.
const PREAMBLE_PATTERN: &str =
    r"(?i)^(okay|alright|sure|here is|here's|my speech is|as requested)[,.:]?\s*";

/// A fenced ```json { ... }``` block anywhere in the response.
const FENCED_JSON_PATTERN: &str = r"(?is)```(?:json)?\s*(\{.*?\})\s*```";

#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Key(String),
    Speech(Speech),
}

/// Parse raw output for the given action kind. `None` signals parse failure.
pub fn parse(
    kind: ActionKind,
    raw: &str,
    options: &BTreeMap<String, String>,
) -> Option<Parsed> {
    match kind {
        ActionKind::Speak => parse_speech(raw).map(Parsed::Speech),
        ActionKind::Vote | ActionKind::ImpKill | ActionKind::Investigate => {
            parse_selection(raw, options).map(Parsed::Key)
        }
    }
}

/// The cleaned form the parser worked on, recorded in failure descriptors so
/// the arbiter reinterprets the same text.
pub fn cleaned_text(kind: ActionKind, raw: &str) -> String {
    match kind {
        ActionKind::Speak => extract_speech_payload(raw),
        _ => clean_selection(raw),
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// Wire shape of a speech record. Missing intent/tone fall back to defaults;
/// the model layer never sees the raw field names.
#[derive(Debug, serde::Deserialize)]
struct RawSpeech {
    speech_content: String,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    target_player: Option<String>,
    #[serde(default)]
    tone: Option<String>,
}

/// Extract one structured speech record: prefer a fenced JSON block, else
/// treat the cleaned whole text as the record. Empty content is a failure.
pub fn parse_speech(raw: &str) -> Option<Speech> {
    let payload = extract_speech_payload(raw);
    let parsed: RawSpeech = match serde_json::from_str(&payload) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("speech parse failed: {err}; payload: '{}'", truncate(&payload));
            return None;
        }
    };

    let content = parsed.speech_content.trim().to_string();
    if content.is_empty() {
        warn!("speech record validated but speech_content is empty");
        return None;
    }
    Some(Speech {
        content,
        intent: non_empty(parsed.intent).unwrap_or_else(|| DEFAULT_INTENT.to_string()),
        target: non_empty(parsed.target_player),
        tone: non_empty(parsed.tone).unwrap_or_else(|| DEFAULT_TONE.to_string()),
    })
}

fn extract_speech_payload(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(fenced) = Regex::new(FENCED_JSON_PATTERN) {
        if let Some(captures) = fenced.captures(trimmed) {
            if let Some(block) = captures.get(1) {
                debug!("extracted fenced JSON block from response");
                return block.as_str().trim().to_string();
            }
        }
    }
    strip_preamble(trimmed)
        .trim_matches('`')
        .trim()
        .to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Target selection
// ---------------------------------------------------------------------------

/// Resolve raw output to exactly one option key, or fail.
///
/// Resolution order: (1) the entire cleaned text equals a key; (2) a key
/// occurs as a standalone token and the whole text is just that key wrapped
/// in punctuation or quotes. Anything else fails, including a key buried in
/// prose and responses naming several distinct keys.
pub fn parse_selection(raw: &str, options: &BTreeMap<String, String>) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let cleaned = clean_selection(raw);
    if options.contains_key(cleaned.as_str()) {
        debug!("parsed key via direct match: {cleaned}");
        return Some(cleaned);
    }

    let candidate = first_key_occurrence(&cleaned, options)?;
    let standalone = format!(
        r#"^[\s.,!"'(]*{}[\s.,!"')]*$"#,
        regex::escape(&candidate)
    );
    let Ok(standalone) = Regex::new(&standalone) else {
        return None;
    };
    if standalone.is_match(&cleaned) {
        debug!("parsed key via standalone match: {candidate}");
        Some(candidate)
    } else {
        warn!(
            "key '{candidate}' found but buried in ambiguous text '{}'",
            truncate(&cleaned)
        );
        None
    }
}

/// First word-boundary occurrence of any option key in `text`. This is the
/// permissive scan the arbiter reuses for its one-shot reinterpretation.
pub fn first_key_occurrence(
    text: &str,
    options: &BTreeMap<String, String>,
) -> Option<String> {
    if options.is_empty() || text.is_empty() {
        return None;
    }
    let alternation: Vec<String> = options.keys().map(|k| regex::escape(k)).collect();
    let pattern = format!(r"\b({})\b", alternation.join("|"));
    let Ok(keys) = Regex::new(&pattern) else {
        return None;
    };
    keys.find(text).map(|m| m.as_str().to_string())
}

fn clean_selection(raw: &str) -> String {
    strip_preamble(raw.trim())
        .trim_matches('`')
        .trim()
        .to_string()
}

fn strip_preamble(text: &str) -> String {
    match Regex::new(PREAMBLE_PATTERN) {
        Ok(preamble) => preamble.replace(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn truncate(text: &str) -> &str {
    let mut end = text.len().min(150);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

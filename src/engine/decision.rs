//! Decision sources: where the engine gets answers from. Phase nodes only
//! see the `DecisionSource` trait; whether the answer came from a model call
//! or a console read is invisible to them.

use std::io::{BufRead, Write};

use log::{error, info};

use crate::engine::llm_client::LlmClient;
use crate::engine::parser::{self, Parsed};
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::action::{
    ActionRequest, Decision, DecisionFailure, FailureKind, Speech,
};

pub trait DecisionSource {
    fn decide(&mut self, request: &ActionRequest) -> Decision;
}

// ---------------------------------------------------------------------------
// LLM-backed source
// ---------------------------------------------------------------------------

pub struct LlmSource {
    client: LlmClient,
}

impl LlmSource {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl DecisionSource for LlmSource {
    fn decide(&mut self, request: &ActionRequest) -> Decision {
        let system = PromptBuilder::system_prompt(&request.player_id, request.role);
        let user = PromptBuilder::task_prompt(request);
        info!(
            "requesting llm decision: player={} action={}",
            request.player_id, request.kind
        );

        let raw = match self.client.chat(&system, &user) {
            Ok(raw) => raw,
            Err(err) => {
                error!(
                    "llm call failed for {} ({}): {err:#}",
                    request.player_id, request.kind
                );
                return Decision::Failure(DecisionFailure::from_request(
                    FailureKind::CallFailed,
                    request,
                ));
            }
        };

        let cleaned = parser::cleaned_text(request.kind, &raw);
        match parser::parse(request.kind, &raw, &request.options) {
            Some(Parsed::Key(key)) => Decision::Key(key),
            Some(Parsed::Speech(speech)) => Decision::Speech(speech),
            None => Decision::Failure(
                DecisionFailure::from_request(FailureKind::ParseFailed, request)
                    .with_output(raw, cleaned),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Console-backed source for the human seat
// ---------------------------------------------------------------------------

/// Reads the human player's decisions from the console. Selection prompts
/// re-ask on invalid input; end of input forfeits the action.
pub struct HumanConsoleSource;

impl HumanConsoleSource {
    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                error!("console read failed: {err}");
                None
            }
        }
    }
}

impl DecisionSource for HumanConsoleSource {
    fn decide(&mut self, request: &ActionRequest) -> Decision {
        let mut out = std::io::stdout();
        if request.kind.is_secret() {
            let _ = writeln!(out, "\n(Only you see this.)");
        }
        let _ = writeln!(out, "\n{}", request.prompt);

        if request.kind.is_selection() {
            for (key, target) in &request.options {
                let _ = writeln!(out, "  {key}: {target}");
            }
            loop {
                let _ = write!(out, "Enter the number of your choice: ");
                let _ = out.flush();
                let Some(input) = self.read_line() else {
                    return Decision::Failure(DecisionFailure::from_request(
                        FailureKind::CallFailed,
                        request,
                    ));
                };
                if request.options.contains_key(input.as_str()) {
                    return Decision::Key(input);
                }
                let _ = writeln!(out, "Invalid choice '{input}'. Try again.");
            }
        }

        let _ = write!(out, "Your statement (blank to stay silent): ");
        let _ = out.flush();
        match self.read_line() {
            // Blank input is a deliberate silence, not a failure.
            Some(line) => Decision::Speech(Speech::plain(line)),
            None => Decision::Failure(DecisionFailure::from_request(
                FailureKind::CallFailed,
                request,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatches each request to the human console or the model, based on who
/// owns the seat.
pub struct DecisionRouter {
    llm: LlmSource,
    human: HumanConsoleSource,
}

impl DecisionRouter {
    pub fn new(client: LlmClient) -> Self {
        Self {
            llm: LlmSource::new(client),
            human: HumanConsoleSource,
        }
    }
}

impl DecisionSource for DecisionRouter {
    fn decide(&mut self, request: &ActionRequest) -> Decision {
        if request.is_human {
            self.human.decide(request)
        } else {
            self.llm.decide(request)
        }
    }
}

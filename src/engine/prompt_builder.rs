//! Builds the prompts sent to the LLM for each decision.
//! This module is intentionally dumb: it only formats text.
//! No parsing, no networking, no engine logic.

use std::collections::BTreeMap;

use crate::model::action::{ActionKind, ActionRequest};
use crate::model::game_state::GameState;
use crate::model::player::Role;

/// How many trailing public log entries get quoted into the prompt.
const RECENT_LOG_COUNT: usize = 3;

pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt: the actor's standing identity and win condition.
    pub fn system_prompt(player_id: &str, role: Role) -> String {
        role_briefing(player_id, role)
    }

    /// User prompt: the current public situation, any private information,
    /// and the task block for this decision.
    pub fn task_prompt(request: &ActionRequest) -> String {
        let mut prompt = String::new();
        push_situation(&mut prompt, &request.state, &request.player_id, request.role);
        push_task(&mut prompt, request.kind, &request.options, &request.prompt);
        prompt
    }
}

fn role_briefing(player_id: &str, role: Role) -> String {
    match role {
        Role::Impostor => format!(
            "You are Player {player_id} in a social deduction game set in a small town. \
You are secretly the Impostor. Each night you eliminate one townsperson; each day \
you must blend in, deflect suspicion, and steer the vote away from yourself. \
You win when the remaining townspeople no longer outnumber you. \
Never reveal your role."
        ),
        Role::Villager => format!(
            "You are Player {player_id} in a social deduction game set in a small town. \
You are a Villager. One player among you is secretly an Impostor killing \
townspeople at night. Use the discussion and the voting record to work out who \
it is, and vote to execute them. You win when the Impostor is eliminated."
        ),
        Role::Investigator => format!(
            "You are Player {player_id} in a social deduction game set in a small town. \
You are the Investigator, a Villager with a gift: each night you may examine one \
player and learn whether they are good or evil. Use what you learn carefully. \
Revealing too much too soon may make you the Impostor's next victim. You win \
when the Impostor is eliminated."
        ),
    }
}

fn push_situation(prompt: &mut String, state: &GameState, player_id: &str, role: Role) {
    let round = state.round;
    prompt.push_str(&format!("--- Current Situation (Round {round}) ---\n"));
    prompt.push_str(&format!(
        "Alive Players ({}): {}\n",
        state.alive_players.len(),
        state.alive_players.join(", ")
    ));

    let victim = state.last_victim.as_deref().unwrap_or("None confirmed");
    prompt.push_str(&format!("Last Night's Victim: {victim}\n"));

    let executed = match &state.last_executed {
        Some(outcome) => outcome.to_string(),
        None if round > 1 => "None (Not yet determined)".to_string(),
        None => "N/A (Round 1)".to_string(),
    };
    prompt.push_str(&format!("Last Executed Player: {executed}\n"));

    if !state.previous_round_votes.is_empty() {
        prompt.push_str(&format!(
            "\nPrevious Vote Breakdown (Round {}):\n",
            round.saturating_sub(1)
        ));
        for (voter, target) in &state.previous_round_votes {
            prompt.push_str(&format!("  - {voter} voted for {target}\n"));
        }
    }

    let tail_start = state.public_log.len().saturating_sub(RECENT_LOG_COUNT);
    let tail = &state.public_log[tail_start..];
    if !tail.is_empty() {
        prompt.push_str(&format!("\nRecent Events Log (Last {RECENT_LOG_COUNT}):\n"));
        for entry in tail {
            prompt.push_str(&format!("- {}\n", entry.context_line()));
        }
    }

    if role == Role::Investigator {
        if let Some(result) = state.pending_night_results.get(player_id) {
            prompt.push_str("\n--- Your Private Information ---\n");
            prompt.push_str(&format!("- Last Night's Investigation Result: {result}\n"));
            prompt.push_str("--- End Private Information ---\n");
        }
    }
    prompt.push_str("--- End Situation ---\n");
}

fn push_task(
    prompt: &mut String,
    kind: ActionKind,
    options: &BTreeMap<String, String>,
    prompt_message: &str,
) {
    prompt.push_str("\n--- Your Task ---\n");
    prompt.push_str(prompt_message);
    prompt.push('\n');

    if kind.is_selection() {
        prompt.push_str("Available Options:\n");
        for (key, target) in options {
            prompt.push_str(&format!("  {key}: {target}\n"));
        }
        prompt.push_str(
            "\n**IMPORTANT: Reply with ONLY the numerical key (e.g., '1', '2', '3') \
corresponding to your choice.**\n\
**Do NOT add explanations, commentary, or conversational text like 'Okay' or 'I choose'.**\n",
        );
    } else {
        prompt.push_str(
            "\n**IMPORTANT: Reply ONLY with the JSON object representing your speech action.**\n\
**Ensure the JSON is valid. Do not add introductions like 'My speech is:' or \
conversational text outside the JSON.**\n\
```json\n\
{\n\
  \"speech_content\": \"...\",\n\
  \"intent\": \"...\",\n\
  \"target_player\": \"... or null\",\n\
  \"tone\": \"...\"\n\
}\n\
```\n",
        );
    }
    prompt.push_str("--- End Task ---\n");
}

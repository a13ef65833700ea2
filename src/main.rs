mod engine;
mod model;

use anyhow::{Context, Result};

use engine::decision::DecisionRouter;
use engine::graph::GameController;
use engine::llm_client::LlmClient;
use model::game_state::{GameConfig, GameState};

const DEFAULT_ROSTER: [&str; 4] = ["Alice", "Bob", "Charlie", "David"];

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with the RUST_LOG env var:
    //   RUST_LOG=info    # phase transitions + decisions
    //   RUST_LOG=debug   # + parser details and prompt sizes
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|a| a == "--help" || a == "-h").unwrap_or(false) {
        println!(
            "Usage: hollowvale [human-player-name]\n\
             \n\
             Runs a social deduction game where every seat is played by an LLM.\n\
             Pass a name to take that seat yourself (it is added to the roster\n\
             if not already present).\n\
             \n\
             Environment:\n  \
             LLM_BASE_URL     OpenAI-compatible endpoint (default http://localhost:1234/v1)\n  \
             LLM_MODEL        model name (default local-model)\n  \
             LLM_TEMPERATURE  sampling temperature (default 0.7)\n  \
             RUST_LOG         log filter (default warn)"
        );
        return Ok(());
    }

    let mut player_ids: Vec<String> = DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect();
    let human_player_id = args.get(1).cloned();
    if let Some(human) = &human_player_id {
        if !player_ids.contains(human) {
            player_ids.push(human.clone());
        }
        println!("You are playing as '{human}'.");
    }

    let client = LlmClient::from_env().context("configuring LLM client")?;
    match client.test_connection() {
        Ok(status) => println!("LLM endpoint: {status}"),
        Err(err) => println!("Warning: LLM endpoint not reachable yet ({err:#})."),
    }

    let state = GameState::initialize(&GameConfig {
        player_ids,
        human_player_id,
    })
    .context("setting up the game")?;
    println!(
        "Starting game with players: {}",
        state.alive_players.join(", ")
    );

    let controller = GameController::new(state, DecisionRouter::new(client));
    let final_state = controller.run().context("running the game")?;

    if let Some(winner) = final_state.winner {
        println!("\nResult: the {winner} team wins after {} round(s).", final_state.round);
    }
    println!(
        "Survivors: {}",
        if final_state.alive_players.is_empty() {
            "none".to_string()
        } else {
            final_state.alive_players.join(", ")
        }
    );

    Ok(())
}

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::services::dialogue;
use crate::state::AppState;

const SESSION: &str = "cli";

/// Line-oriented front end; `exit` or `quit` ends the loop.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    println!("Welcome to the appointment booking agent! Type 'exit' or 'quit' to leave.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match dialogue::handle_turn(&state, SESSION, input).await {
            Ok(reply) => println!("Agent: {reply}"),
            Err(e) => {
                tracing::error!(error = %e, "turn processing failed");
                println!("Agent: Sorry, something went wrong. Please try again.");
            }
        }
    }

    Ok(())
}

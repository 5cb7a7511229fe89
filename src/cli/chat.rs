//! Terminal chat loop.

use super::output::Output;
use crate::types::Result;
use crate::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Input that ends the conversation.
const EXIT_COMMANDS: [&str; 3] = ["/exit", "/quit", "/q"];

/// Run one chat session on stdin/stdout until `/exit` or EOF.
///
/// A failed turn is reported and the loop continues with the history as
/// it was before that turn.
pub async fn run(state: &AppState, output: &Output) -> Result<()> {
    let session_id = state.sessions.create();
    let session = state.sessions.get(&session_id)?;

    output.banner();
    output.info(&format!(
        "{} document(s) indexed, model {}",
        state.index.count().await?,
        state.pipeline.model_name()
    ));
    output.hint("Type /exit or press Ctrl-D to leave");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        output.user_prompt();
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| crate::AppError::Internal(format!("stdin: {}", e)))?
        else {
            println!();
            break;
        };

        if EXIT_COMMANDS.contains(&line.trim()) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut guard = session.lock().await;
        match guard.turn(&state.pipeline, &line).await {
            Ok(answer) => {
                let note = if answer.used_context {
                    format!("from {}", answer.sources.join(", "))
                } else {
                    "general knowledge".to_string()
                };
                output.assistant(&answer.text, &note);
            }
            Err(e) => output.error(&e.to_string()),
        }
    }

    state.sessions.end(&session_id)?;
    Ok(())
}

//! Conversation creation and message sending
//!
//! `run_new` creates a conversation; `run_send` performs one full
//! send-message unit of work and prints the assistant reply.

use crate::chat::RecordOutcome;
use crate::config::Config;
use crate::error::Result;
use crate::prompts;
use colored::Colorize;

/// Resolve the system prompt for a send: explicit text wins over a preset,
/// a preset wins over the configured default.
fn resolve_system_prompt(
    config: &Config,
    preset: Option<&str>,
    system_prompt: Option<&str>,
) -> Result<String> {
    if let Some(text) = system_prompt {
        return Ok(text.to_string());
    }
    let name = preset.unwrap_or(&config.chat.system_prompt_preset);
    Ok(prompts::preset(name)?.to_string())
}

/// Create a new conversation and print its id
pub fn run_new(
    config: Config,
    title: Option<String>,
    preset: Option<String>,
    system_prompt: Option<String>,
) -> Result<()> {
    let principal = config.principal()?;
    let service = super::build_service(&config)?;

    // Only store a system message when the caller asked for one; the
    // per-send default preset covers the common case.
    let stored_prompt = match (&system_prompt, &preset) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(name)) => Some(prompts::preset(name)?.to_string()),
        (None, None) => None,
    };

    let conversation =
        service.create_conversation(&principal, title.as_deref(), stored_prompt.as_deref())?;

    println!(
        "Created conversation {} ({})",
        conversation.id[..8].cyan(),
        conversation.title
    );
    println!(
        "Use {} to continue it.",
        format!("chatledger send --conversation {} <message>", &conversation.id[..8]).cyan()
    );

    Ok(())
}

/// Send a message, creating a conversation when none was given
pub async fn run_send(
    config: Config,
    conversation: Option<String>,
    preset: Option<String>,
    message: String,
) -> Result<()> {
    let principal = config.principal()?;
    let service = super::build_service(&config)?;

    let conversation_id = match conversation {
        Some(id) => id,
        None => {
            let record = service.create_conversation(&principal, None, None)?;
            println!("Started conversation {}", record.id[..8].cyan());
            record.id
        }
    };

    let system_prompt = resolve_system_prompt(&config, preset.as_deref(), None)?;

    let outcome = service
        .send_message(&principal, &conversation_id, &message, Some(&system_prompt))
        .await?;

    if let Some(title) = &outcome.title {
        println!("{}", format!("Titled: {}", title).green());
    }

    println!("\n{}\n", outcome.reply.content);
    println!(
        "{}",
        format!(
            "[{} | {} tokens]",
            &outcome.conversation_id[..8],
            outcome.reply.tokens_used
        )
        .dimmed()
    );

    if let RecordOutcome::Dropped(reason) = &outcome.usage {
        tracing::warn!("Usage event was not recorded: {}", reason);
    }

    Ok(())
}

use crate::chat::Principal;
use crate::cli::HistoryCommand;
use crate::error::{ChatLedgerError, Result};
use crate::storage::SqliteStorage;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
///
/// Works directly on storage: browsing and deleting conversations needs
/// no completion provider.
pub fn handle_history(principal: &Principal, command: HistoryCommand) -> Result<()> {
    let storage = SqliteStorage::new()?;

    match command {
        HistoryCommand::List => {
            let conversations = storage.list_conversations(&principal.id)?;

            if conversations.is_empty() {
                println!("{}", "No conversations found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Model".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);

            for conversation in conversations {
                let id_short = &conversation.id[..8];
                let title = if conversation.title.len() > 40 {
                    format!("{}...", &conversation.title[..37])
                } else {
                    conversation.title
                };
                let updated = conversation.updated_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    id_short.cyan(),
                    title,
                    conversation.model,
                    conversation.message_count,
                    updated
                ]);
            }

            println!("\nConversations:");
            table.printstd();
            println!();
            println!(
                "Use {} to continue one.",
                "chatledger send --conversation <ID> <message>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id, limit } => {
            let conversation = storage
                .get_conversation(&principal.id, &id)?
                .ok_or_else(|| ChatLedgerError::ConversationNotFound(id.clone()))?;
            let messages = storage.recent_messages(&conversation.id, limit)?;

            println!(
                "\n{} ({}, {} messages shown)\n",
                conversation.title.bold(),
                &conversation.id[..8],
                messages.len()
            );

            for message in messages {
                let role = match message.role.as_str() {
                    "user" => message.role.cyan(),
                    "assistant" => message.role.green(),
                    _ => message.role.yellow(),
                };
                println!("{}: {}\n", role, message.content);
            }
        }
        HistoryCommand::Delete { id } => {
            if storage.delete_conversation(&principal.id, &id)? {
                println!("{}", format!("Deleted conversation {}", id).green());
            } else {
                println!("{}", format!("No conversation matching {}", id).yellow());
            }
        }
    }

    Ok(())
}

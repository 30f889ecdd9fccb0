//! Token usage and quota reporting

use crate::chat::{Principal, UsageLedger};
use crate::error::Result;
use crate::storage::SqliteStorage;
use colored::Colorize;
use prettytable::{format, Table};

/// Print usage statistics and quota standing for the principal
pub async fn show_usage(principal: &Principal) -> Result<()> {
    let storage = SqliteStorage::new()?;
    let ledger = UsageLedger::new(storage.clone());

    let check = ledger.check_quota(&principal.id, principal.plan).await;
    let conversations = storage.conversation_count(&principal.id).unwrap_or(0);
    let messages = storage.message_count(&principal.id).unwrap_or(0);

    println!(
        "\nUsage for {} ({} plan):\n",
        principal.id.bold(),
        principal.plan.to_string().cyan()
    );

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Window".bold(),
        "Used".bold(),
        "Limit".bold(),
        "Remaining".bold()
    ]);
    table.add_row(prettytable::row![
        "Daily",
        check.daily_used,
        check.limits.daily_tokens,
        check.remaining_daily
    ]);
    table.add_row(prettytable::row![
        "Monthly",
        check.monthly_used,
        check.limits.monthly_tokens,
        check.remaining_monthly
    ]);
    table.printstd();

    println!();
    println!("Conversations: {}", conversations);
    println!("Messages:      {}", messages);
    println!(
        "Per-request token cap: {}",
        check.limits.max_tokens_per_request
    );

    if check.allowed {
        println!("{}", "\nRequests are allowed.".green());
    } else {
        println!(
            "{}",
            "\nQuota exhausted: new requests will be rejected.".red()
        );
    }
    println!();

    Ok(())
}

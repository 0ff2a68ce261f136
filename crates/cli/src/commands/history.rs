//! `careguide history`: Show the most recent exchanges.

use std::path::Path;

use careguide_core::exchange::TIMESTAMP_FORMAT;
use careguide_core::history::ConversationLog;
use careguide_history::JsonFileLog;

use crate::bootstrap::load_config;

pub async fn run(config_path: Option<&Path>, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let log = JsonFileLog::new(&config.history.log_path);

    let total = log.count().await?;
    let entries = log.recent(limit).await?;

    println!("📜 Conversation history ({} of {total})", entries.len());
    println!("   Log: {}", log.path().display());
    println!();

    if entries.is_empty() {
        println!("  No exchanges logged yet.");
        return Ok(());
    }

    for entry in &entries {
        let marker = if entry.was_safe { "✅" } else { "⚠️ " };
        println!("  {marker} {}", entry.timestamp.format(TIMESTAMP_FORMAT));
        println!("     Usuário:    {}", entry.user_text);
        for (i, line) in entry.assistant_text.lines().enumerate() {
            let label = if i == 0 { "Assistente: " } else { "            " };
            println!("     {label}{line}");
        }
        println!();
    }

    Ok(())
}

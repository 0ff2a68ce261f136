//! `careguide ask`: Answer a single question.

use std::path::Path;

use careguide_agent::Disposition;

use crate::bootstrap::{Assistant, load_config};

pub async fn run(config_path: Option<&Path>, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    if config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CAREGUIDE_API_KEY = 'gsk_...'");
        eprintln!("    GROQ_API_KEY      = 'gsk_...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", careguide_config::AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let assistant = Assistant::assemble(config).await?;

    eprint!("  Thinking...");
    let outcome = assistant.pipeline.handle(message).await?;
    eprint!("\r              \r");

    println!("{}", outcome.text);

    if outcome.disposition == Disposition::Answered && !outcome.passages.is_empty() {
        eprintln!();
        eprintln!("  ({} passages from the manual)", outcome.passages.len());
    }
    if !outcome.logged {
        eprintln!("  ⚠️  This exchange could not be saved to the history log");
    }

    Ok(())
}

//! `careguide status`: Show configuration and index state.

use std::path::Path;

use careguide_config::AppConfig;
use careguide_core::history::ConversationLog;
use careguide_history::JsonFileLog;
use careguide_knowledge::SnapshotCache;
use careguide_knowledge::index::fingerprint;

use crate::bootstrap::load_config;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    println!("🧠 {} Status", config.service_name);
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.provider);
    println!("  Endpoint:     {}", config.provider_base_url());
    println!("  Model:        {}", config.model);
    println!("  Temperature:  {}", config.temperature);
    println!("  API key:      {}", if config.api_key.is_some() { "configured" } else { "missing" });
    println!("  Embeddings:   {} @ {}", config.knowledge.embedding_model, config.knowledge.embedding_api_url);
    println!("  Retrieval:    top {}", config.knowledge.top_k);
    println!("  History:      last {} exchanges", config.history.window);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Audio:        {}", if config.audio.enabled { "enabled" } else { "disabled" });

    println!();
    let cache = SnapshotCache::new(config.knowledge.snapshot_dir());
    match tokio::fs::read(&config.knowledge.source_path).await {
        Ok(document) => {
            let fp = fingerprint(
                &document,
                config.knowledge.chunk_size,
                config.knowledge.chunk_overlap,
                &config.knowledge.embedding_model,
            );
            match cache.load(&fp).await {
                Some(snapshot) => println!(
                    "  ✅ Index up to date: {} passages, built {}",
                    snapshot.chunks.len(),
                    snapshot.created_at.format("%Y-%m-%d %H:%M")
                ),
                None => println!(
                    "  ⚠️  No usable index at {} — it will be built on next start",
                    cache.path().display()
                ),
            }
        }
        Err(e) => println!(
            "  ❌ Manual not readable at {}: {e}",
            config.knowledge.source_path.display()
        ),
    }

    let log = JsonFileLog::new(&config.history.log_path);
    match log.count().await {
        Ok(n) => println!("  ✅ {n} exchange(s) logged in {}", log.path().display()),
        Err(e) => println!("  ❌ History log unreadable: {e}"),
    }

    Ok(())
}

//! `careguide doctor`: Diagnose backends and files.

use std::path::Path;

use careguide_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 CareGuide Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            if path.exists() {
                println!("  ✅ Config file valid ({})", path.display());
            } else {
                println!("  ⚠️  No config file at {} — using defaults", path.display());
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  Fix the config file before running other checks.");
            return Ok(());
        }
    };

    if config.api_key.is_some() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key — set CAREGUIDE_API_KEY or GROQ_API_KEY");
        issues += 1;
    }

    if config.knowledge.source_path.is_file() {
        println!("  ✅ Manual found ({})", config.knowledge.source_path.display());
    } else {
        println!("  ❌ Manual missing: {}", config.knowledge.source_path.display());
        issues += 1;
    }

    let embedder = careguide_providers::build_embedder(&config);
    match embedder.health_check().await {
        Ok(true) => println!("  ✅ Embedding endpoint reachable ({})", config.knowledge.embedding_api_url),
        Ok(false) => {
            println!("  ⚠️  Embedding endpoint answered with an error ({})", config.knowledge.embedding_api_url);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Embedding endpoint unreachable: {e}");
            issues += 1;
        }
    }

    if let Ok(router) = careguide_providers::build_from_config(&config) {
        match router.generation.health_check().await {
            Ok(true) => println!("  ✅ Generation endpoint reachable ({})", config.provider_base_url()),
            Ok(false) => {
                println!("  ⚠️  Generation endpoint rejected the credential");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Generation endpoint unreachable: {e}");
                issues += 1;
            }
        }
    }

    if config.audio.enabled {
        match tokio::fs::create_dir_all(&config.audio.output_dir).await {
            Ok(()) => println!("  ✅ Audio directory writable ({})", config.audio.output_dir.display()),
            Err(e) => {
                println!("  ❌ Audio directory unusable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ℹ️  Audio disabled");
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

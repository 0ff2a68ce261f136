//! `careguide serve`: Start the HTTP gateway.

use std::path::Path;

use crate::bootstrap::{Assistant, load_config};

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let assistant = Assistant::assemble(config).await?;

    println!("🧠 {}", assistant.config.service_name);
    println!("   Listening: {addr}");
    println!("   Model:     {}", assistant.config.model);
    println!("   Passages:  {} indexed", assistant.knowledge.len());
    println!("   Audio:     {}", if assistant.audio.is_some() { "enabled" } else { "disabled" });

    careguide_gateway::serve(assistant.gateway_state(), &addr).await?;

    Ok(())
}

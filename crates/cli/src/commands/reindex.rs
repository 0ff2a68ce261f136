//! `careguide reindex`: Rebuild the knowledge index from the manual.

use std::path::Path;

use careguide_knowledge::KnowledgeBase;

use crate::bootstrap::load_config;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let embedder = careguide_providers::build_embedder(&config);

    println!("📚 Rebuilding knowledge index");
    println!("   Source:    {}", config.knowledge.source_path.display());
    println!("   Embedding: {}", config.knowledge.embedding_model);
    println!(
        "   Chunks:    {} chars, {} overlap",
        config.knowledge.chunk_size, config.knowledge.chunk_overlap
    );

    let started = std::time::Instant::now();
    let knowledge = KnowledgeBase::rebuild(&config.knowledge, embedder.as_ref()).await?;

    println!();
    println!(
        "  ✅ Indexed {} passages ({} dimensions) in {:.1}s",
        knowledge.len(),
        knowledge.dimension(),
        started.elapsed().as_secs_f32()
    );
    println!(
        "     Cache: {}",
        config.knowledge.snapshot_dir().join("index.json").display()
    );

    Ok(())
}

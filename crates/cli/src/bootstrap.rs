//! Assembles the assistant from configuration.
//!
//! Everything is built once here and shared by `Arc`; the gateway and the
//! `ask` command run against the same wiring.

use std::path::Path;
use std::sync::Arc;

use careguide_agent::{AnswerPipeline, AudioBridge, GuardrailFilter, PipelineSettings};
use careguide_config::AppConfig;
use careguide_core::history::ConversationLog;
use careguide_gateway::{AppState, SharedState};
use careguide_history::{HistoryWindow, JsonFileLog};
use careguide_knowledge::{KnowledgeBase, KnowledgeRetriever};
use tracing::info;

/// Load config from `path` if given, otherwise from `~/.careguide/config.toml`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The fully wired assistant.
pub struct Assistant {
    pub config: AppConfig,
    pub knowledge: Arc<KnowledgeBase>,
    pub pipeline: Arc<AnswerPipeline>,
    pub audio: Option<Arc<AudioBridge>>,
}

impl Assistant {
    /// Build providers, load or build the index, and wire the pipeline.
    ///
    /// Fails when the credential is missing or the knowledge base cannot be
    /// built.
    pub async fn assemble(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let router = careguide_providers::build_from_config(&config)?;

        let knowledge = Arc::new(
            KnowledgeBase::load_or_build(&config.knowledge, router.embedding.as_ref()).await?,
        );
        info!(
            chunks = knowledge.len(),
            cached = knowledge.from_cache(),
            "Knowledge base ready"
        );

        let retriever = Arc::new(KnowledgeRetriever::new(
            knowledge.clone(),
            router.embedding.clone(),
        ));
        let log: Arc<dyn ConversationLog> = Arc::new(JsonFileLog::new(&config.history.log_path));

        let pipeline = Arc::new(AnswerPipeline::new(
            GuardrailFilter::builtin()?,
            retriever,
            router.generation.clone(),
            HistoryWindow::new(log, config.history.window),
            PipelineSettings::from_config(&config),
        ));

        let audio = match (&router.transcriber, &router.synthesizer) {
            (Some(transcriber), Some(synthesizer)) => Some(Arc::new(AudioBridge::new(
                transcriber.clone(),
                synthesizer.clone(),
                &config.audio,
            ))),
            _ => None,
        };

        Ok(Self {
            config,
            knowledge,
            pipeline,
            audio,
        })
    }

    /// Gateway state sharing this assistant's pipeline and audio bridge.
    pub fn gateway_state(&self) -> SharedState {
        Arc::new(AppState {
            pipeline: self.pipeline.clone(),
            audio: self.audio.clone(),
            audio_dir: self.config.audio.output_dir.clone(),
            service_name: self.config.service_name.clone(),
            start_time: chrono::Utc::now(),
        })
    }
}

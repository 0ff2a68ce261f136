//! Provider router: builds one backend per capability from config.
//!
//! Generation, embeddings, and the two speech directions may each live on a
//! different host, so each gets its own adapter instance.

use std::sync::Arc;
use std::time::Duration;

use careguide_config::{AppConfig, ConfigError};
use careguide_core::audio::{Synthesizer, Transcriber};
use careguide_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;
use crate::speech::{OpenAiCompatSynthesizer, OpenAiCompatTranscriber};

/// The capability backends the assistant runs against.
#[derive(Clone)]
pub struct ProviderRouter {
    pub generation: Arc<dyn Provider>,
    pub embedding: Arc<dyn Provider>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl ProviderRouter {
    /// Speech is usable only when both directions are configured.
    pub fn audio_enabled(&self) -> bool {
        self.transcriber.is_some() && self.synthesizer.is_some()
    }
}

/// Build providers from configuration.
///
/// Fails when the generation credential is missing.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderRouter, ConfigError> {
    let api_key = config.require_api_key()?.to_string();

    let generation: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::with_timeout(
        &config.provider,
        config.provider_base_url(),
        &api_key,
        Duration::from_secs(config.generation_timeout_secs),
    ));

    let embedding = build_embedder(config);

    let (transcriber, synthesizer) = if config.audio.enabled {
        let audio = &config.audio;
        let timeout = Duration::from_secs(audio.timeout_secs);
        let transcriber: Arc<dyn Transcriber> = Arc::new(OpenAiCompatTranscriber::new(
            audio.api_url.clone().unwrap_or_else(|| config.provider_base_url()),
            audio.api_key.clone().unwrap_or_else(|| api_key.clone()),
            &audio.transcription_model,
            &audio.language,
            timeout,
        ));
        let synthesizer: Arc<dyn Synthesizer> = Arc::new(OpenAiCompatSynthesizer::new(
            &audio.synthesis_api_url,
            audio.api_key.clone().unwrap_or_default(),
            &audio.synthesis_model,
            timeout,
        ));
        (Some(transcriber), Some(synthesizer))
    } else {
        (None, None)
    };

    Ok(ProviderRouter {
        generation,
        embedding,
        transcriber,
        synthesizer,
    })
}

/// Build the embedding backend alone.
///
/// Indexing needs no generation credential, so this never fails.
pub fn build_embedder(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        "embeddings",
        &config.knowledge.embedding_api_url,
        config.knowledge.embedding_api_key.clone().unwrap_or_default(),
    ))
}

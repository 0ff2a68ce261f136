//! Configuration loading, validation, and management for CareGuide.
//!
//! Loads configuration from `~/.careguide/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.
//! The resulting [`AppConfig`] is passed by value into every constructor;
//! nothing reads configuration from globals after startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.careguide/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation provider name (selects a default base URL)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Generation model
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature, kept low for factual consistency
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per generated answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single generation call
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Service identity reported by the status endpoints
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Knowledge base and retrieval settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Conversation log settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Speech settings
    #[serde(default)]
    pub audio: AudioConfig,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_service_name() -> String {
    "Agente Cuidador POC".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("generation_timeout_secs", &self.generation_timeout_secs)
            .field("service_name", &self.service_name)
            .field("knowledge", &self.knowledge)
            .field("history", &self.history)
            .field("gateway", &self.gateway)
            .field("audio", &self.audio)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Plain-text manual the index is built from
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// Directory holding index snapshots
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Snapshot name; one subdirectory per knowledge source
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Passages retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// OpenAI-compatible endpoint serving `/embeddings`
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("manual_cuidador.txt")
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".index_cache")
}
fn default_cache_name() -> String {
    "manual_cuidador".into()
}
fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_top_k() -> usize {
    3
}
fn default_embedding_api_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_embedding_model() -> String {
    "bge-m3".into()
}

impl KnowledgeConfig {
    /// Directory of the snapshot for this knowledge source.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.cache_dir.join(&self.cache_name)
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            cache_dir: default_cache_dir(),
            cache_name: default_cache_name(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding_api_url: default_embedding_api_url(),
            embedding_api_key: None,
            embedding_model: default_embedding_model(),
        }
    }
}

impl std::fmt::Debug for KnowledgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeConfig")
            .field("source_path", &self.source_path)
            .field("cache_dir", &self.cache_dir)
            .field("cache_name", &self.cache_name)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("top_k", &self.top_k)
            .field("embedding_api_url", &self.embedding_api_url)
            .field("embedding_api_key", &redact(&self.embedding_api_key))
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Exchanges injected into each prompt
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("historico_conversas.json")
}
fn default_window() -> usize {
    5
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            window: default_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Transcription endpoint; defaults to the generation provider's URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Defaults to the generation API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Fixed recognition language
    #[serde(default = "default_language")]
    pub language: String,

    /// OpenAI-compatible `/audio/speech` endpoint
    #[serde(default = "default_synthesis_api_url")]
    pub synthesis_api_url: String,

    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: String,

    #[serde(default = "default_female_voice")]
    pub female_voice: String,

    #[serde(default = "default_male_voice")]
    pub male_voice: String,

    /// Where synthesized MP3 files are written and served from
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_audio_timeout")]
    pub timeout_secs: u64,
}

fn default_transcription_model() -> String {
    "whisper-large-v3".into()
}
fn default_language() -> String {
    "pt".into()
}
fn default_synthesis_api_url() -> String {
    "http://localhost:5050/v1".into()
}
fn default_synthesis_model() -> String {
    "tts-1".into()
}
fn default_female_voice() -> String {
    "pt-BR-FranciscaNeural".into()
}
fn default_male_voice() -> String {
    "pt-BR-AntonioNeural".into()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("audio")
}
fn default_audio_timeout() -> u64 {
    60
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: None,
            api_key: None,
            transcription_model: default_transcription_model(),
            language: default_language(),
            synthesis_api_url: default_synthesis_api_url(),
            synthesis_model: default_synthesis_model(),
            female_voice: default_female_voice(),
            male_voice: default_male_voice(),
            output_dir: default_output_dir(),
            timeout_secs: default_audio_timeout(),
        }
    }
}

impl std::fmt::Debug for AudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioConfig")
            .field("enabled", &self.enabled)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("transcription_model", &self.transcription_model)
            .field("language", &self.language)
            .field("synthesis_api_url", &self.synthesis_api_url)
            .field("synthesis_model", &self.synthesis_model)
            .field("female_voice", &self.female_voice)
            .field("male_voice", &self.male_voice)
            .field("output_dir", &self.output_dir)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.careguide/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment overrides:
    /// - `CAREGUIDE_API_KEY` (highest priority)
    /// - `GROQ_API_KEY`
    /// - `CAREGUIDE_MODEL`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("CAREGUIDE_API_KEY")
                .ok()
                .or_else(|| std::env::var("GROQ_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(model) = std::env::var("CAREGUIDE_MODEL") {
            config.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".careguide")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.knowledge.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_size must be > 0".into(),
            ));
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_overlap must be smaller than knowledge.chunk_size".into(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.top_k must be at least 1".into(),
            ));
        }

        if self.history.window == 0 {
            return Err(ConfigError::ValidationError(
                "history.window must be at least 1".into(),
            ));
        }

        if self.generation_timeout_secs == 0 || self.audio.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least 1 second".into(),
            ));
        }

        Ok(())
    }

    /// The generation credential, or a startup-fatal error when absent.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(
                "set api_key in config.toml or the GROQ_API_KEY environment variable",
            ))
    }

    /// Base URL of the generation provider.
    pub fn provider_base_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| default_base_url(&self.provider))
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            generation_timeout_secs: default_generation_timeout(),
            service_name: default_service_name(),
            knowledge: KnowledgeConfig::default(),
            history: HistoryConfig::default(),
            gateway: GatewayConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing API credential: {0}")]
    MissingCredential(&'static str),
}

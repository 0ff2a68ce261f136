//! Audio bridge: speech in and out around the text pipeline.
//!
//! Synthesized answers are written as `speech_<uuid>.mp3` under the output
//! directory and served back by file name.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use careguide_config::AudioConfig;
use careguide_core::audio::{Synthesizer, Transcriber, VoiceGender};
use careguide_core::error::AudioError;
use tracing::{debug, info};

/// A synthesized answer on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Strip markdown markers so the text reads naturally aloud.
///
/// Removes `*`, `#` and `-`, then bracketed spans on a single line, then
/// collapses whitespace.
pub fn clean_text_for_speech(text: &str) -> String {
    let unmarked: String = text.chars().filter(|c| !matches!(c, '*' | '#' | '-')).collect();

    let mut out = String::with_capacity(unmarked.len());
    let mut rest = unmarked.as_str();
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find([']', '\n']) {
            Some(close) if after[close..].starts_with(']') => {
                out.push_str(&rest[..open]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct AudioBridge {
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    output_dir: PathBuf,
    female_voice: String,
    male_voice: String,
    timeout: Duration,
}

impl AudioBridge {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        config: &AudioConfig,
    ) -> Self {
        Self {
            transcriber,
            synthesizer,
            output_dir: config.output_dir.clone(),
            female_voice: config.female_voice.clone(),
            male_voice: config.male_voice.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The configured voice identifier for `voice`.
    pub fn voice_id(&self, voice: VoiceGender) -> &str {
        match voice {
            VoiceGender::Female => &self.female_voice,
            VoiceGender::Male => &self.male_voice,
        }
    }

    /// Transcribe an uploaded clip.
    pub async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, AudioError> {
        if audio.is_empty() {
            return Err(AudioError::Capability("empty audio upload".into()));
        }

        let text = tokio::time::timeout(self.timeout, self.transcriber.transcribe(audio, filename))
            .await
            .map_err(|_| AudioError::Timeout {
                operation: "transcription",
                timeout_secs: self.timeout.as_secs(),
            })??;

        debug!(chars = text.chars().count(), "Transcription complete");
        Ok(text.trim().to_string())
    }

    /// Speak `text` and store the result.
    pub async fn synthesize(&self, text: &str, voice: VoiceGender) -> Result<SpeechArtifact, AudioError> {
        let clean = clean_text_for_speech(text);
        if clean.is_empty() {
            return Err(AudioError::EmptyText);
        }

        let voice_id = self.voice_id(voice);
        let bytes = tokio::time::timeout(self.timeout, self.synthesizer.synthesize(&clean, voice_id))
            .await
            .map_err(|_| AudioError::Timeout {
                operation: "synthesis",
                timeout_secs: self.timeout.as_secs(),
            })??;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AudioError::Storage(format!("Failed to create audio directory: {e}")))?;

        let filename = format!("speech_{}.mp3", uuid::Uuid::new_v4());
        let path = self.output_dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AudioError::Storage(format!("Failed to write {}: {e}", path.display())))?;

        let size_bytes = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(AudioError::EmptyArtifact { path });
            }
        };

        info!(file = %filename, voice = voice_id, size_bytes, "Speech synthesized");
        Ok(SpeechArtifact {
            filename,
            path,
            size_bytes,
        })
    }

    /// Resolve a stored artifact by file name.
    pub fn artifact_path(&self, filename: &str) -> Result<PathBuf, AudioError> {
        resolve_artifact(&self.output_dir, filename)
    }
}

/// Join `filename` onto `dir` if it is a bare artifact name.
///
/// Separators, parent references and hidden names are rejected.
pub fn resolve_artifact(dir: &Path, filename: &str) -> Result<PathBuf, AudioError> {
    let valid = !filename.is_empty()
        && !filename.starts_with('.')
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if !valid {
        return Err(AudioError::InvalidFilename(filename.to_string()));
    }
    Ok(dir.join(filename))
}

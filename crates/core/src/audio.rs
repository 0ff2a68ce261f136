//! Speech capabilities: transcription (speech → text) and synthesis
//! (text → speech). Both are optional and independent of the text pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::AudioError;

/// Which of the two configured voices to speak with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl std::str::FromStr for VoiceGender {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" | "feminino" | "f" => Ok(Self::Female),
            "male" | "masculino" | "m" => Ok(Self::Male),
            other => Err(AudioError::Capability(format!("unknown voice gender '{other}'"))),
        }
    }
}

/// Speech-to-text capability.
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe an encoded audio clip. `filename` carries the container
    /// hint (e.g. `gravacao.webm`) some backends need.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
    ) -> std::result::Result<String, AudioError>;
}

/// Text-to-speech capability.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Render `text` with the named voice, returning MP3 bytes.
    async fn synthesize(&self, text: &str, voice: &str) -> std::result::Result<Vec<u8>, AudioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_voice_gender_flags() {
        assert_eq!("male".parse::<VoiceGender>().unwrap(), VoiceGender::Male);
        assert_eq!("Feminino".parse::<VoiceGender>().unwrap(), VoiceGender::Female);
        assert!("robot".parse::<VoiceGender>().is_err());
    }

    #[test]
    fn default_voice_is_female() {
        assert_eq!(VoiceGender::default(), VoiceGender::Female);
    }
}

//! The answer pipeline: the heart of CareGuide.
//!
//! Every caregiver question follows the same fixed path:
//!
//! 1. **Guard** the message against the forbidden-term list
//! 2. **Retrieve** manual passages and **window** recent history, concurrently
//! 3. **Compose** the grounded prompt and **generate** one completion
//! 4. **Sanitize** the answer and **log** the exchange
//!
//! Speech in and out lives in [`audio`] and wraps the pipeline without
//! touching it.

pub mod audio;
pub mod guardrail;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;

#[cfg(test)]
mod test_helpers;

pub use audio::{AudioBridge, SpeechArtifact, clean_text_for_speech, resolve_artifact};
pub use guardrail::{FORBIDDEN_TERMS, GuardrailFilter, GuardrailVerdict};
pub use pipeline::{
    AnswerPipeline, Disposition, FAILURE_TEXT, PipelineError, PipelineSettings, REFUSAL_TEXT,
    TurnOutcome, TurnStage,
};
pub use prompt::{PromptComposer, PromptPayload};
pub use sanitizer::sanitize;

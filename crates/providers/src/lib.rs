//! Provider implementations for CareGuide.
//!
//! Every backend speaks the OpenAI wire format. The router builds one
//! adapter per capability based on configuration.

pub mod openai_compat;
pub mod router;
pub mod speech;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_embedder, build_from_config};
pub use speech::{OpenAiCompatSynthesizer, OpenAiCompatTranscriber};

//! # CareGuide Core
//!
//! Domain types, capability traits, and error definitions for the CareGuide
//! caregiver assistant. This crate has **zero framework dependencies**: it
//! defines the domain model that every other crate implements against.
//!
//! ## Capabilities
//!
//! Each external collaborator is a trait here, implemented elsewhere:
//! - [`Provider`]: text generation and embeddings (`careguide-providers`)
//! - [`Retriever`]: top-k passage lookup (`careguide-knowledge`)
//! - [`ConversationLog`]: append-only exchange history (`careguide-history`)
//! - [`Transcriber`] / [`Synthesizer`]: speech in and out (`careguide-providers`)
//!
//! Swapping any of them for a stub is how the pipeline is tested.

pub mod audio;
pub mod error;
pub mod exchange;
pub mod history;
pub mod message;
pub mod provider;
pub mod retriever;

// Re-export key types at crate root for ergonomics
pub use audio::{Synthesizer, Transcriber, VoiceGender};
pub use error::{Error, Result};
pub use exchange::Exchange;
pub use history::ConversationLog;
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retriever::{RetrievedPassage, Retriever};

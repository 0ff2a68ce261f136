//! Shared test doubles for pipeline and audio tests.

use async_trait::async_trait;
use careguide_core::audio::{Synthesizer, Transcriber};
use careguide_core::error::{AudioError, ProviderError, RetrievalError};
use careguide_core::message::Message;
use careguide_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use careguide_core::retriever::{RetrievedPassage, Retriever};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A provider that returns a sequence of scripted replies and records the
/// requests it saw.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Sleep before answering.
    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::text(reply)
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            assert!(!replies.is_empty(), "ScriptedProvider: no more replies");
            replies.remove(0)
        };

        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A retriever returning fixed passages, or a fixed error.
pub struct StubRetriever {
    result: Result<Vec<RetrievedPassage>, RetrievalError>,
    calls: AtomicUsize,
}

impl StubRetriever {
    pub fn with_texts(texts: &[&str]) -> Self {
        let passages = texts
            .iter()
            .enumerate()
            .map(|(i, t)| RetrievedPassage {
                text: t.to_string(),
                rank: i + 1,
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        Self {
            result: Ok(passages),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    fn name(&self) -> &str {
        "stub"
    }

    async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map(|mut passages| {
                passages.truncate(k);
                passages
            })
    }
}

/// Returns a fixed transcript.
pub struct StubTranscriber(pub Result<String, String>);

#[async_trait]
impl Transcriber for StubTranscriber {
    fn name(&self) -> &str {
        "stub"
    }

    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> Result<String, AudioError> {
        self.0.clone().map_err(AudioError::Capability)
    }
}

/// Returns fixed audio bytes and records the text and voice id it was given.
pub struct StubSynthesizer {
    pub bytes: Vec<u8>,
    pub seen: Mutex<Vec<(String, String)>>,
    pub delay: Option<Duration>,
}

impl StubSynthesizer {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            seen: Mutex::new(Vec::new()),
            delay: None,
        }
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, AudioError> {
        self.seen.lock().unwrap().push((text.to_string(), voice.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.bytes.clone())
    }
}

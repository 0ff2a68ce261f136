//! The answer pipeline: one guarded, retrieval-augmented turn.
//!
//! # Flow
//!
//! 1. Reject blank input
//! 2. Guardrail check on the raw message; unsafe input gets the fixed refusal
//! 3. Retrieve passages and read the history window concurrently
//! 4. Compose the prompt and call the provider once, under a timeout
//! 5. Sanitize the answer
//! 6. Append the exchange to the log (best-effort)
//!
//! Retrieval and generation failures never escape: they become the fixed
//! apology, logged with `safe = false`.

use std::sync::Arc;
use std::time::Duration;

use careguide_config::AppConfig;
use careguide_core::error::{Error, ProviderError};
use careguide_core::exchange::Exchange;
use careguide_core::message::Message;
use careguide_core::provider::{Provider, ProviderRequest};
use careguide_core::retriever::{RetrievedPassage, Retriever};
use careguide_history::HistoryWindow;
use tracing::{debug, error, info, warn};

use crate::guardrail::{GuardrailFilter, GuardrailVerdict};
use crate::prompt::PromptComposer;
use crate::sanitizer::sanitize;

/// Returned for guardrail rejections.
pub const REFUSAL_TEXT: &str = "⚠️ ALERTA DE SEGURANÇA: Não posso orientar sobre medicação ou emergências. Contate o médico imediatamente.";

/// Returned when retrieval or generation fails.
pub const FAILURE_TEXT: &str = "Desculpe, tive um erro técnico ao processar sua solicitação.";

/// Generation parameters for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Passages retrieved per turn
    pub top_k: usize,
    pub generation_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            top_k: config.knowledge.top_k,
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// States a turn passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Received,
    Guarded,
    Refused,
    Retrieving,
    Composing,
    Generating,
    Sanitizing,
    Failed,
    Logged,
    Responded,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Answered,
    Refused,
    Failed,
}

/// The result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub text: String,
    pub is_safe: bool,
    pub disposition: Disposition,
    pub stages: Vec<TurnStage>,
    /// False when the exchange could not be persisted
    pub logged: bool,
    pub passages: Vec<RetrievedPassage>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Envie uma mensagem de texto")]
    EmptyMessage,
}

pub struct AnswerPipeline {
    guardrail: GuardrailFilter,
    retriever: Arc<dyn Retriever>,
    provider: Arc<dyn Provider>,
    history: HistoryWindow,
    settings: PipelineSettings,
}

impl AnswerPipeline {
    pub fn new(
        guardrail: GuardrailFilter,
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn Provider>,
        history: HistoryWindow,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            guardrail,
            retriever,
            provider,
            history,
            settings,
        }
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one turn for `user_text`.
    pub async fn handle(&self, user_text: &str) -> Result<TurnOutcome, PipelineError> {
        if user_text.trim().is_empty() {
            return Err(PipelineError::EmptyMessage);
        }

        let mut stages = vec![TurnStage::Received];
        let verdict = self.guardrail.evaluate(user_text);
        stages.push(TurnStage::Guarded);

        let (text, disposition, passages) = match verdict {
            GuardrailVerdict::Unsafe { term } => {
                warn!(%term, "Message blocked by guardrail");
                stages.push(TurnStage::Refused);
                (REFUSAL_TEXT.to_string(), Disposition::Refused, Vec::new())
            }
            GuardrailVerdict::Safe => match self.answer(user_text, &mut stages).await {
                Ok((answer, passages)) => (answer, Disposition::Answered, passages),
                Err(e) => {
                    error!(error = %e, "Answer generation failed");
                    stages.push(TurnStage::Failed);
                    (FAILURE_TEXT.to_string(), Disposition::Failed, Vec::new())
                }
            },
        };

        let is_safe = disposition == Disposition::Answered;
        let logged = match self
            .history
            .log()
            .append(Exchange::now(user_text, &text, is_safe))
            .await
        {
            Ok(()) => {
                stages.push(TurnStage::Logged);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to log exchange");
                false
            }
        };
        stages.push(TurnStage::Responded);

        info!(?disposition, is_safe, logged, "Turn complete");

        Ok(TurnOutcome {
            text,
            is_safe,
            disposition,
            stages,
            logged,
            passages,
        })
    }

    async fn answer(
        &self,
        user_text: &str,
        stages: &mut Vec<TurnStage>,
    ) -> Result<(String, Vec<RetrievedPassage>), Error> {
        stages.push(TurnStage::Retrieving);
        let (passages, history) = tokio::join!(
            self.retriever.retrieve(user_text, self.settings.top_k),
            self.history.recent()
        );
        let passages = passages?;
        debug!(passages = passages.len(), history = history.len(), "Context gathered");

        stages.push(TurnStage::Composing);
        let payload =
            PromptComposer::compose(user_text, HistoryWindow::render(&history), &passages);

        stages.push(TurnStage::Generating);
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(payload.render())],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stop: Vec::new(),
        };

        let timeout = self.settings.generation_timeout;
        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("no answer within {}s", timeout.as_secs()))
            })??;

        stages.push(TurnStage::Sanitizing);
        let answer = sanitize(&response.message.content);
        if answer.is_empty() {
            return Err(Error::Provider(ProviderError::ApiError {
                status_code: 200,
                message: "empty answer".into(),
            }));
        }

        Ok((answer, passages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use careguide_core::error::RetrievalError;
    use careguide_core::history::ConversationLog;
    use careguide_history::{InMemoryLog, JsonFileLog};

    struct Harness {
        pipeline: AnswerPipeline,
        provider: Arc<ScriptedProvider>,
        retriever: Arc<StubRetriever>,
        log: Arc<InMemoryLog>,
    }

    fn harness_with(provider: ScriptedProvider, retriever: StubRetriever, log: InMemoryLog) -> Harness {
        let provider = Arc::new(provider);
        let retriever = Arc::new(retriever);
        let log = Arc::new(log);
        let pipeline = AnswerPipeline::new(
            GuardrailFilter::builtin().unwrap(),
            retriever.clone(),
            provider.clone(),
            HistoryWindow::new(log.clone(), 5),
            PipelineSettings {
                generation_timeout: Duration::from_millis(200),
                ..PipelineSettings::default()
            },
        );
        Harness {
            pipeline,
            provider,
            retriever,
            log,
        }
    }

    fn harness(reply: &str) -> Harness {
        harness_with(
            ScriptedProvider::text(reply),
            StubRetriever::with_texts(&["Trecho 1", "Trecho 2", "Trecho 3"]),
            InMemoryLog::new(),
        )
    }

    #[tokio::test]
    async fn safe_question_is_answered_and_logged() {
        let h = harness("Resposta:\n\n- Mantenha a rotina\n- Fale com calma");
        let outcome = h.pipeline.handle("Como acalmar minha mãe à noite?").await.unwrap();

        assert_eq!(outcome.text, "- Mantenha a rotina\n- Fale com calma");
        assert!(outcome.is_safe);
        assert_eq!(outcome.disposition, Disposition::Answered);
        assert!(outcome.logged);
        assert_eq!(outcome.passages.len(), 3);
        assert_eq!(
            outcome.stages,
            vec![
                TurnStage::Received,
                TurnStage::Guarded,
                TurnStage::Retrieving,
                TurnStage::Composing,
                TurnStage::Generating,
                TurnStage::Sanitizing,
                TurnStage::Logged,
                TurnStage::Responded,
            ]
        );

        let logged = h.log.all().await;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].user_text, "Como acalmar minha mãe à noite?");
        assert_eq!(logged[0].assistant_text, outcome.text);
        assert!(logged[0].was_safe);
    }

    #[tokio::test]
    async fn unsafe_question_never_reaches_retrieval_or_generation() {
        let h = harness("não deveria ser usado");
        let outcome = h.pipeline.handle("Qual a dose do remédio?").await.unwrap();

        assert_eq!(outcome.text, REFUSAL_TEXT);
        assert!(!outcome.is_safe);
        assert_eq!(outcome.disposition, Disposition::Refused);
        assert_eq!(h.provider.call_count(), 0);
        assert_eq!(h.retriever.call_count(), 0);
        assert!(outcome.stages.contains(&TurnStage::Refused));

        let logged = h.log.all().await;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].assistant_text, REFUSAL_TEXT);
        assert!(!logged[0].was_safe);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_logging() {
        let h = harness("x");
        assert!(matches!(h.pipeline.handle("").await, Err(PipelineError::EmptyMessage)));
        assert!(matches!(h.pipeline.handle("  \n\t").await, Err(PipelineError::EmptyMessage)));
        assert_eq!(h.log.count().await.unwrap(), 0);
        assert_eq!(h.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn generation_failure_becomes_apology() {
        let h = harness_with(
            ScriptedProvider::failing(ProviderError::Network("connection reset".into())),
            StubRetriever::with_texts(&["Trecho"]),
            InMemoryLog::new(),
        );
        let outcome = h.pipeline.handle("Como lidar com a teimosia?").await.unwrap();

        assert_eq!(outcome.text, FAILURE_TEXT);
        assert!(!outcome.is_safe);
        assert_eq!(outcome.disposition, Disposition::Failed);
        assert!(outcome.stages.contains(&TurnStage::Failed));

        let logged = h.log.all().await;
        assert_eq!(logged[0].assistant_text, FAILURE_TEXT);
        assert!(!logged[0].was_safe);
    }

    #[tokio::test]
    async fn retrieval_failure_skips_generation() {
        let h = harness_with(
            ScriptedProvider::text("x"),
            StubRetriever::failing(RetrievalError::Embedding("offline".into())),
            InMemoryLog::new(),
        );
        let outcome = h.pipeline.handle("Dicas para o banho?").await.unwrap();

        assert_eq!(outcome.text, FAILURE_TEXT);
        assert_eq!(h.provider.call_count(), 0);
        assert_eq!(h.log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let h = harness_with(
            ScriptedProvider::slow("tarde demais", Duration::from_secs(5)),
            StubRetriever::with_texts(&["Trecho"]),
            InMemoryLog::new(),
        );
        let outcome = h.pipeline.handle("Como organizar a rotina?").await.unwrap();
        assert_eq!(outcome.disposition, Disposition::Failed);
        assert_eq!(outcome.text, FAILURE_TEXT);
    }

    #[tokio::test]
    async fn empty_answer_after_sanitizing_is_a_failure() {
        let h = harness("Dicas:\n\n");
        let outcome = h.pipeline.handle("Alguma dica?").await.unwrap();
        assert_eq!(outcome.disposition, Disposition::Failed);
    }

    #[tokio::test]
    async fn prompt_carries_history_context_and_question() {
        let prior = (0..7)
            .map(|i| Exchange::now(format!("pergunta {i}"), format!("resposta {i}"), true))
            .collect();
        let h = harness_with(
            ScriptedProvider::text("ok"),
            StubRetriever::with_texts(&["Trecho A", "Trecho B", "Trecho C", "Trecho D"]),
            InMemoryLog::with_entries(prior),
        );
        h.pipeline.handle("Nova pergunta").await.unwrap();

        let request = h.provider.last_request().unwrap();
        assert_eq!(request.messages.len(), 1);
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.model, "llama-3.3-70b-versatile");

        let prompt = &request.messages[0].content;
        assert!(prompt.contains("Trecho A\n\nTrecho B\n\nTrecho C"));
        assert!(!prompt.contains("Trecho D"));
        assert!(!prompt.contains("pergunta 1\n"));
        assert!(prompt.contains("Usuário: pergunta 2\nAssistente: resposta 2"));
        assert!(prompt.contains("Usuário: pergunta 6\nAssistente: resposta 6"));
        assert!(prompt.contains("Pergunta Atual do Usuário: Nova pergunta"));
    }

    #[tokio::test]
    async fn first_turn_uses_history_sentinel() {
        let h = harness("ok");
        h.pipeline.handle("Olá").await.unwrap();
        let prompt = h.provider.last_request().unwrap().messages[0].content.clone();
        assert!(prompt.contains("Nenhuma conversa anterior."));
    }

    #[tokio::test]
    async fn log_failure_is_reported_not_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "corrompido").unwrap();

        let provider = Arc::new(ScriptedProvider::text("Use roupas confortáveis."));
        let pipeline = AnswerPipeline::new(
            GuardrailFilter::builtin().unwrap(),
            Arc::new(StubRetriever::with_texts(&["Trecho"])),
            provider,
            HistoryWindow::new(Arc::new(JsonFileLog::new(&path)), 5),
            PipelineSettings::default(),
        );

        let outcome = pipeline.handle("Como vestir meu pai?").await.unwrap();
        assert_eq!(outcome.text, "Use roupas confortáveis.");
        assert!(!outcome.logged);
        assert!(!outcome.stages.contains(&TurnStage::Logged));
        assert_eq!(outcome.stages.last(), Some(&TurnStage::Responded));
    }

    #[tokio::test]
    async fn each_turn_appends_exactly_once() {
        let h = harness_with(
            ScriptedProvider::new(vec![Ok("a".into()), Ok("b".into())]),
            StubRetriever::with_texts(&["Trecho"]),
            InMemoryLog::new(),
        );
        h.pipeline.handle("primeira").await.unwrap();
        h.pipeline.handle("hospital?").await.unwrap();
        h.pipeline.handle("segunda").await.unwrap();
        assert_eq!(h.log.count().await.unwrap(), 3);
        assert_eq!(h.provider.call_count(), 2);
        assert_eq!(h.retriever.call_count(), 2);
    }
}

//! HTTP gateway for CareGuide.
//!
//! Exposes the caregiver chat, speech transcription, synthesized audio
//! files, the recent history window, and liveness probes.
//!
//! Built on Axum; every request runs on its own tokio task.

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request};
use axum::{
    Form, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use careguide_agent::{AnswerPipeline, AudioBridge, PipelineError, resolve_artifact};
use careguide_core::audio::VoiceGender;
use careguide_core::error::AudioError;
use careguide_core::exchange::Exchange;
use careguide_core::history::ConversationLog;

/// Largest accepted request body (recorded audio included).
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct AppState {
    pub pipeline: Arc<AnswerPipeline>,
    /// Present only when speech is enabled
    pub audio: Option<Arc<AudioBridge>>,
    /// Where synthesized files are served from
    pub audio_dir: PathBuf,
    pub service_name: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
///
/// CORS is fully permissive: the browser frontend is served from another
/// origin during development.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/transcribe", post(transcribe_handler))
        .route("/audio/{filename}", get(audio_handler))
        .route("/history", get(history_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: SharedState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Responses ---

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn audio_failure(e: &AudioError) -> ApiError {
    match e {
        AudioError::Disabled => api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        AudioError::InvalidFilename(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        _ => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    service: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    timestamp: String,
    version: &'static str,
    uptime_secs: i64,
}

// --- Handlers ---

async fn root_handler(State(state): State<SharedState>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "online",
        service: state.service_name.clone(),
    })
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let now = chrono::Local::now();
    Json(HealthResponse {
        status: "online",
        service: state.service_name.clone(),
        timestamp: now.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
    })
}

#[derive(Default, Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    voice: Option<String>,
}

fn unreadable_form(e: impl std::fmt::Display) -> ApiError {
    warn!(error = %e, "Unreadable chat form");
    api_error(StatusCode::BAD_REQUEST, PipelineError::EmptyMessage.to_string())
}

/// Chat fields from either a urlencoded or a multipart form.
///
/// A request with no recognizable form body yields empty fields, so the
/// missing message is reported by the pipeline like any other empty one.
struct ChatInput(ChatForm);

impl<S> FromRequest<S> for ChatInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(unreadable_form)?;
            let mut form = ChatForm::default();
            while let Some(field) = multipart.next_field().await.map_err(unreadable_form)? {
                let name = field.name().map(str::to_string);
                let value = field.text().await.map_err(unreadable_form)?;
                match name.as_deref() {
                    Some("message") => form.message = Some(value),
                    Some("voice") => form.voice = Some(value),
                    _ => {}
                }
            }
            Ok(Self(form))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<ChatForm>::from_request(req, state)
                .await
                .map_err(unreadable_form)?;
            Ok(Self(form))
        } else {
            Ok(Self(ChatForm::default()))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text_response: String,
    pub audio_url: Option<String>,
    pub is_safe: bool,
}

async fn chat_handler(
    State(state): State<SharedState>,
    ChatInput(form): ChatInput,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = form.message.unwrap_or_default();

    let voice = match form.voice.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Some(
            raw.parse::<VoiceGender>()
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        ),
        None => None,
    };

    info!(chars = message.chars().count(), ?voice, "Chat request");

    let outcome = state
        .pipeline
        .handle(&message)
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let audio_url = match (voice, &state.audio) {
        (Some(voice), Some(bridge)) => {
            let artifact = bridge.synthesize(&outcome.text, voice).await.map_err(|e| {
                error!(error = %e, "Speech synthesis failed");
                audio_failure(&e)
            })?;
            Some(format!("/audio/{}", artifact.filename))
        }
        (Some(_), None) => {
            warn!("Voice requested but audio is disabled");
            None
        }
        (None, _) => None,
    };

    Ok(Json(ChatResponse {
        text_response: outcome.text,
        audio_url,
        is_safe: outcome.is_safe,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

async fn transcribe_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let bridge = state
        .audio
        .clone()
        .ok_or_else(|| audio_failure(&AudioError::Disabled))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("audio.webm").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
            upload = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) = upload
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Envie um arquivo de áudio no campo 'file'"))?;

    info!(file = %filename, bytes = bytes.len(), "Transcription request");

    let text = bridge.transcribe(bytes.to_vec(), &filename).await.map_err(|e| {
        error!(error = %e, "Transcription failed");
        audio_failure(&e)
    })?;

    Ok(Json(TranscribeResponse { text }))
}

async fn audio_handler(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || api_error(StatusCode::NOT_FOUND, format!("Arquivo não encontrado: {filename}"));

    let path = resolve_artifact(&state.audio_dir, &filename).map_err(|e| {
        warn!(error = %e, "Rejected audio file name");
        not_found()
    })?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes)),
        Err(_) => {
            warn!(path = %path.display(), "Audio file not found");
            Err(not_found())
        }
    }
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub total: usize,
    pub entries: Vec<Exchange>,
}

async fn history_handler(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let window = state.pipeline.history();
    let limit = query.limit.unwrap_or(window.limit());
    let log = window.log();

    let storage_error = |e: careguide_core::error::LogError| {
        error!(error = %e, "Failed to read conversation log");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    };

    let entries = log.recent(limit).await.map_err(storage_error)?;
    let total = log.count().await.map_err(storage_error)?;

    Ok(Json(HistoryResponse { total, entries }))
}

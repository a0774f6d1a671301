//! JSON HTTP surface for a single conversation.
//!
//! One [`Conversation`] lives for the lifetime of the process; every request
//! operates on it. Requests are serialized by a mutex, so an ingest and a
//! question never interleave.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/documents` | Ingest `{ "path": ... }` or `{ "text": ..., "id": ... }` |
//! | `POST`   | `/ask` | Answer `{ "question": ... }` |
//! | `GET`    | `/conversation` | Current document, summary, and history |
//! | `DELETE` | `/conversation` | Forget the document and history |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unsupported_format` (415),
//! `no_text` (422), `internal` (500).

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::conversation::Conversation;
use crate::error::{AskError, ExtractError, IngestError};
use crate::models::{ChatTurn, IngestReport};
use crate::pipeline::Pipeline;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    conversation: Arc<Mutex<Conversation>>,
}

/// Build the pipeline from `config` and serve on `[server].bind`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config).await?);
    let listener = TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %config.server.bind, "listening");
    serve(listener, pipeline).await
}

/// Serve the API on an already-bound listener.
pub async fn serve(listener: TcpListener, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let conversation = Arc::new(Mutex::new(pipeline.new_conversation()));
    let state = AppState {
        pipeline,
        conversation,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/documents", post(handle_ingest))
        .route("/ask", post(handle_ask))
        .route(
            "/conversation",
            get(handle_get_conversation).delete(handle_clear_conversation),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let (status, code) = match &err {
            IngestError::Extract(ExtractError::UnsupportedFormat(_)) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
            }
            IngestError::NoText(_) => (StatusCode::UNPROCESSABLE_ENTITY, "no_text"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<AskError> for AppError {
    fn from(err: AskError) -> Self {
        match err {
            AskError::EmptyQuestion => bad_request(err.to_string()),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct IngestRequest {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestReport>, AppError> {
    let mut conversation = state.conversation.lock().await;
    let report = match (req.path, req.text) {
        (Some(path), None) => state.pipeline.ingest_path(&mut conversation, &path).await?,
        (None, Some(text)) => {
            state
                .pipeline
                .ingest_text(&mut conversation, &text, req.id.as_deref())
                .await?
        }
        _ => return Err(bad_request("provide exactly one of 'path' or 'text'")),
    };
    Ok(Json(report))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    history: Vec<ChatTurn>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let mut conversation = state.conversation.lock().await;
    let answer = state.pipeline.ask(&mut conversation, &req.question).await?;
    Ok(Json(AskResponse {
        answer,
        history: conversation.history().to_vec(),
    }))
}

// ============ /conversation ============

async fn handle_get_conversation(State(state): State<AppState>) -> Json<Conversation> {
    Json(state.conversation.lock().await.clone())
}

async fn handle_clear_conversation(State(state): State<AppState>) -> StatusCode {
    state.conversation.lock().await.clear();
    StatusCode::NO_CONTENT
}

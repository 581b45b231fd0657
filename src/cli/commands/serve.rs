//! HTTP API server exposing the transcription pipeline.
//!
//! A single authenticated endpoint: POST /transcribe takes a YouTube URL
//! and returns the final transcript. The Bearer token is checked before
//! any pipeline work begins.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::error::TekstError;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
pub struct AppState {
    orchestrator: Orchestrator,
    secret: String,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, secret: String) -> Self {
        Self {
            orchestrator,
            secret,
        }
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    preflight::check(preflight::Operation::Serve, &settings)?;

    let secret = settings.auth.secret.clone().ok_or_else(|| {
        anyhow::anyhow!("No authentication secret configured. Set SECRET_CODE before starting.")
    })?;

    let orchestrator = Orchestrator::new(&settings)?;
    let state = Arc::new(AppState::new(orchestrator, secret));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tekst API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Transcribe", "POST /transcribe");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router. Split out so tests can drive it directly.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/transcribe", post(transcribe))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct TranscribeRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct TranscribeResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

/// Bearer-token guard, run before the handler sees the request.
async fn require_auth(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.secret);

    if !authorized {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    next.run(req).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscribeRequest>,
) -> Response {
    let url = match req.url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => return error_response(StatusCode::BAD_REQUEST, "No YouTube URL provided"),
    };

    match state.orchestrator.transcribe_url(url).await {
        Ok(result) => Json(TranscribeResponse { result }).into_response(),
        Err(e) => {
            // Full detail stays in the logs; clients get the classified
            // message only.
            error!("Transcription pipeline failed: {}", e);
            let (status, message) = classify_error(&e);
            error_response(status, message)
        }
    }
}

/// Map pipeline errors onto the HTTP surface without leaking internals.
fn classify_error(e: &TekstError) -> (StatusCode, &'static str) {
    match e {
        TekstError::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid YouTube URL"),
        TekstError::AudioDownload(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Audio download failed")
        }
        TekstError::Transcription(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Transcription failed")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Processing failed"),
    }
}

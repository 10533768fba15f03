//! HTTP front end
//!
//! `POST /api/code-execution` judges one submission, `GET /api/languages`
//! lists what can be judged, `GET /health` reports liveness.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use codejudge::{ExecutionBackend, ExecutionRequest, ExecutionResult, Verdict};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub backend: Arc<dyn ExecutionBackend>,
}

#[derive(Debug, Serialize)]
struct LanguageInfo<'a> {
    id: &'a str,
    name: &'a str,
    compiled: bool,
}

/// Create the router with all routes
pub fn create_router(backend: Arc<dyn ExecutionBackend>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/languages", get(languages_handler))
        .route("/api/code-execution", post(execute_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { backend })
}

/// Serve until ctrl-c
pub async fn serve(addr: SocketAddr, backend: Arc<dyn ExecutionBackend>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, backend = backend.name(), "listening");

    axum::serve(listener, create_router(backend))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "backend": state.backend.name(),
    }))
}

async fn languages_handler(State(state): State<AppState>) -> Response {
    let languages: Vec<LanguageInfo<'_>> = state
        .backend
        .registry()
        .iter()
        .map(|(id, lang)| LanguageInfo {
            id,
            name: &lang.name,
            compiled: lang.is_compiled(),
        })
        .collect();
    Json(languages).into_response()
}

async fn execute_handler(
    State(state): State<AppState>,
    body: Result<Json<ExecutionRequest>, JsonRejection>,
) -> (StatusCode, Json<ExecutionResult>) {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "malformed request body");
            let verdict = Verdict::ValidationError {
                reason: "request body must be JSON with 'code' and 'language'".to_owned(),
            };
            let result = ExecutionResult::failure(verdict.error_message().unwrap_or_default(), 0);
            return (StatusCode::BAD_REQUEST, Json(result));
        }
    };

    let judgement = state.backend.judge(request).await;
    let status = if judgement.verdict.is_bad_request() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(judgement.to_result()))
}

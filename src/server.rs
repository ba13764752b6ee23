//! HTTP query service.
//!
//! Exposes the query and stats operations over a small JSON API, sharing one
//! store handle across requests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Health check with backend, embedder, and record count |
//! | `POST` | `/query` | Nearest chunks for `{"query": str, "limit"?: int}` |
//! | `GET`  | `/stats` | Unique files and total chunks |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid JSON body: ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500). The health endpoint
//! reports store failures as `{"status": "error", "error": "..."}` with 500.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use docvec_core::models::QueryHit;

use crate::backend::open_store;
use crate::config::Config;
use crate::pipeline::Pipeline;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    default_limit: usize,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until Ctrl-C, then closes the store and returns.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let pipeline = Arc::new(Pipeline::from_config(config, store.clone())?);
    let app = router(pipeline, config.retrieval.default_limit);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!(
        "docvec listening on http://{} ({})",
        config.server.bind,
        store.backend()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    store.close().await;
    Ok(())
}

/// Build the router. Exposed for embedding and tests.
pub fn router(pipeline: Arc<Pipeline>, default_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        pipeline,
        default_limit,
    };

    Router::new()
        .route("/", get(handle_health))
        .route("/query", post(handle_query))
        .route("/stats", get(handle_stats))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
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

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: err.to_string(),
    }
}

// ============ GET / ============

async fn handle_health(State(state): State<AppState>) -> Response {
    let store = state.pipeline.store();
    match store.count().await {
        Ok(total) => Json(serde_json::json!({
            "status": "healthy",
            "backend": store.backend(),
            "embedder": state.pipeline.embedder().model_name(),
            "documents_indexed": total,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "status": "error",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
    limit: Option<usize>,
}

async fn handle_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Vec<QueryHit>>, AppError> {
    let Json(req) = body.map_err(|e| bad_request(format!("invalid JSON body: {}", e)))?;
    let limit = req.limit.unwrap_or(state.default_limit);
    let hits = state
        .pipeline
        .query(&req.query, limit)
        .await
        .map_err(internal)?;
    Ok(Json(hits))
}

// ============ GET /stats ============

#[derive(Serialize)]
struct StatsResponse {
    unique_files: u64,
    total_chunks: u64,
    backend: &'static str,
}

async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let store = state.pipeline.store();
    let stats = store.aggregate_stats().await.map_err(internal)?;
    Ok(Json(StatsResponse {
        unique_files: stats.unique_files,
        total_chunks: stats.total_chunks,
        backend: store.backend(),
    }))
}

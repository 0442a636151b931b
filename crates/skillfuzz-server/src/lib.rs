//! skillfuzz-server — HTTP service for the scoring pipelines.
//!
//! # Routes
//!
//! - `POST /compute-user-levels/` - per-topic levels plus overall level
//! - `POST /evaluate` - quiz-wide overall level
//! - `GET  /health` - liveness check
//!
//! Both pipelines are built once at startup and shared read-only between
//! requests. Scoring is CPU-bound and runs on the blocking pool.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use skillfuzz_core::model::{
    QuizEvaluationRequest, QuizEvaluationResponse, TopicLevelsRequest, TopicLevelsResponse,
};
use skillfuzz_core::{QuizPipeline, TopicPipeline};

pub mod config;
pub mod error;

pub use config::{load_config, load_config_from, ServerSettings, SkillfuzzConfig};
pub use error::{ApiError, ErrorBody};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub topic: Arc<TopicPipeline>,
    pub quiz: Arc<QuizPipeline>,
}

impl AppState {
    pub fn new(topic: TopicPipeline, quiz: QuizPipeline) -> Self {
        Self {
            topic: Arc::new(topic),
            quiz: Arc::new(quiz),
        }
    }

    /// State with the pipelines shipped in `skillfuzz-core`.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(TopicPipeline::builtin()?, QuizPipeline::builtin()?))
    }

    /// State with the configured pipeline overrides, falling back to the
    /// built-ins.
    pub fn from_config(config: &SkillfuzzConfig) -> anyhow::Result<Self> {
        let topic = match &config.pipelines.topic {
            Some(path) => TopicPipeline::load(path)?,
            None => TopicPipeline::builtin()?,
        };
        let quiz = match &config.pipelines.quiz {
            Some(path) => QuizPipeline::load(path)?,
            None => QuizPipeline::builtin()?,
        };
        Ok(Self::new(topic, quiz))
    }
}

async fn compute_user_levels(
    State(state): State<AppState>,
    Json(request): Json<TopicLevelsRequest>,
) -> Result<Json<TopicLevelsResponse>, ApiError> {
    let pipeline = state.topic.clone();
    let response = tokio::task::spawn_blocking(move || pipeline.handle(&request))
        .await
        .map_err(|e| ApiError::internal(format!("scoring task failed: {e}")))??;
    Ok(Json(response))
}

async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<QuizEvaluationRequest>,
) -> Result<Json<QuizEvaluationResponse>, ApiError> {
    let pipeline = state.quiz.clone();
    let response = tokio::task::spawn_blocking(move || pipeline.handle(&request))
        .await
        .map_err(|e| ApiError::internal(format!("scoring task failed: {e}")))??;
    Ok(Json(response))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Build the router with all routes.
pub fn create_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/compute-user-levels/", post(compute_user_levels))
        .route("/compute-user-levels", post(compute_user_levels))
        .route("/evaluate", post(evaluate))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http());

    let router = if cors_permissive {
        router.layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_origin(Any)
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
    } else {
        router
    };

    router.with_state(state)
}

/// Serve on an already bound listener until Ctrl+C.
pub async fn serve(listener: TcpListener, state: AppState, cors_permissive: bool) -> anyhow::Result<()> {
    let app = create_router(state, cors_permissive);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

/// Bind the configured address and serve.
pub async fn run_server(state: AppState, settings: &ServerSettings) -> anyhow::Result<()> {
    let addr = settings.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        topic = state.topic.system().name(),
        quiz = state.quiz.system().name(),
        "listening on http://{addr}"
    );

    serve(listener, state, settings.cors_permissive).await?;
    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}

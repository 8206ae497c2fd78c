//! HTTP surface for the mock Prometheus backend.
//!
//! Thin bindings only: every handler reads its input, calls one engine
//! operation and serializes the answer.

use crate::error::SimError;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Form, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use stage_core::scenario::valid_names;
use stage_core::{QueryError, QueryResponse, ScenarioEngine, ScenarioKind};
use stage_env::StageConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Content type of the `/metrics` payload.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScenarioEngine>,
}

/// Success envelope used by the scenario endpoints.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

impl<T> Envelope<T> {
    fn success(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data,
        }
    }
}

/// Error envelope used by the scenario endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_scenarios: Option<Vec<&'static str>>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `query` parameter, from the URL or a form body.
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// Body of `POST /prometheus/api/scenario`.
#[derive(Debug, Deserialize)]
pub struct SetScenarioRequest {
    pub scenario: String,
}

/// Create the main router.
///
/// With `prometheus_enabled` false only `/health` is mounted.
pub fn create_router(engine: Arc<ScenarioEngine>, prometheus_enabled: bool) -> Router {
    let mut router = Router::new().route("/health", get(health_check));

    if prometheus_enabled {
        router = router
            .route("/api/v1/query", get(query_from_url).post(query_from_form))
            .route("/metrics", get(metrics))
            .route(
                "/prometheus/api/scenario",
                get(get_scenario).post(set_scenario),
            )
            .route("/prometheus/api/scenario/reset", post(reset_timer))
            .route("/prometheus/api/scenarios", get(list_scenarios));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &StageConfig, engine: Arc<ScenarioEngine>) -> Result<(), SimError> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Starting server on {} (prometheus_enabled={})",
        addr, config.prometheus_enabled
    );

    let router = create_router(Arc::clone(&engine), config.prometheus_enabled);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutting down server...");
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// An unreadable query string or form body is answered like a missing query.
async fn query_from_url(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> (StatusCode, Json<QueryResponse>) {
    run_query(&state, params.ok().and_then(|Query(p)| p.query))
}

async fn query_from_form(
    State(state): State<AppState>,
    params: Result<Form<QueryParams>, FormRejection>,
) -> (StatusCode, Json<QueryResponse>) {
    if let Err(rejection) = &params {
        warn!("Unreadable query form: {}", rejection.body_text());
    }
    run_query(&state, params.ok().and_then(|Form(p)| p.query))
}

fn run_query(state: &AppState, query: Option<String>) -> (StatusCode, Json<QueryResponse>) {
    match query.filter(|q| !q.trim().is_empty()) {
        None => (
            StatusCode::BAD_REQUEST,
            Json(QueryResponse::error(&QueryError::missing())),
        ),
        Some(q) => (
            StatusCode::OK,
            Json(QueryResponse::from_result(state.engine.evaluate_query(&q))),
        ),
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.engine.render_exposition(),
    )
}

async fn get_scenario(State(state): State<AppState>) -> impl IntoResponse {
    Json(Envelope::success(state.engine.status()))
}

async fn set_scenario(
    State(state): State<AppState>,
    body: Result<Json<SetScenarioRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    status: "error",
                    error: format!("invalid request: {}", rejection.body_text()),
                    valid_scenarios: None,
                }),
            )
                .into_response();
        }
    };

    match request.scenario.parse::<ScenarioKind>() {
        Ok(kind) => Json(Envelope::success(state.engine.set_scenario_kind(kind))).into_response(),
        Err(e) => {
            warn!("Rejected scenario switch: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    status: "error",
                    error: "invalid scenario type".to_string(),
                    valid_scenarios: Some(valid_names()),
                }),
            )
                .into_response()
        }
    }
}

async fn reset_timer(State(state): State<AppState>) -> impl IntoResponse {
    Json(Envelope {
        status: "success",
        message: Some("timer reset"),
        data: state.engine.reset_timer(),
    })
}

async fn list_scenarios(State(state): State<AppState>) -> impl IntoResponse {
    Json(Envelope::success(state.engine.list_scenarios()))
}

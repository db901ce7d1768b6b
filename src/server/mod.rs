//! HTTP adapter: live metrics over SSE plus the process endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::system_monitor::{
    AssemblerSettings, Broadcaster, MetricsSnapshot, ProcessLister, ProcessQuery,
    ProcessTerminator, Sources, TerminateFailure,
};
use crate::error::Result;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Broadcaster,
    pub lister: ProcessLister,
    pub terminator: ProcessTerminator,
}

#[derive(Deserialize, Default)]
pub struct ProcessParams {
    sort: Option<String>,
    filter: Option<String>,
    limit: Option<String>,
}

#[derive(Deserialize)]
pub struct KillRequest {
    signal: Option<String>,
}

#[derive(Serialize)]
struct KillResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    subscribers: usize,
    running: bool,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

fn snapshot_event(snapshot: &MetricsSnapshot) -> Event {
    Event::default()
        .json_data(snapshot)
        .unwrap_or_else(|e| {
            log::warn!("Failed to encode snapshot {}: {}", snapshot.seq, e);
            Event::default().comment("encode error")
        })
}

async fn handle_stream(State(state): State<AppState>) -> Response {
    let (subscription, latest) = match state.broadcaster.subscribe_with_latest() {
        Ok(registered) => registered,
        Err(e) => return error_body(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    };
    log::debug!("Stream client attached as subscriber {}", subscription.id());

    let events = stream::iter(latest)
        .chain(subscription.into_stream())
        .map(|snapshot: Arc<MetricsSnapshot>| Ok::<_, Infallible>(snapshot_event(&snapshot)));

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn handle_processes(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
) -> Response {
    let query = match ProcessQuery::parse(
        params.sort.as_deref(),
        params.filter.as_deref(),
        params.limit.as_deref(),
    ) {
        Ok(query) => query,
        Err(e) => {
            let status = if e.is_invalid_input() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            return error_body(status, e.to_string());
        }
    };

    Json(state.lister.list(&query).await).into_response()
}

async fn handle_kill(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    body: std::result::Result<Json<KillRequest>, JsonRejection>,
) -> (StatusCode, Json<KillResponse>) {
    let signal = match body {
        Ok(Json(request)) => request.signal.unwrap_or_default(),
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(KillResponse {
                    success: false,
                    error: Some(rejection.body_text()),
                }),
            )
        }
    };

    match state.terminator.terminate_request(&pid, &signal) {
        Ok(()) => (
            StatusCode::OK,
            Json(KillResponse {
                success: true,
                error: None,
            }),
        ),
        Err(failure) => {
            let status = match failure {
                TerminateFailure::InvalidInput(_) => StatusCode::BAD_REQUEST,
                TerminateFailure::NoSuchProcess(_) => StatusCode::NOT_FOUND,
                TerminateFailure::NotPermitted(_) => StatusCode::FORBIDDEN,
                TerminateFailure::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            log::warn!("Kill request for '{}' failed: {}", pid, failure);
            (
                status,
                Json(KillResponse {
                    success: false,
                    error: Some(failure.to_string()),
                }),
            )
        }
    }
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        subscribers: state.broadcaster.subscriber_count(),
        running: state.broadcaster.is_running(),
    })
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/metrics/stream", get(handle_stream))
        .route("/api/processes", get(handle_processes))
        .route("/api/processes/{pid}/kill", post(handle_kill))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Start the broadcaster and serve until Ctrl-C.
pub async fn run_server(config: &Config) -> Result<()> {
    let sources = Sources::system(config)?;
    let broadcaster = Broadcaster::new(
        sources.clone(),
        AssemblerSettings::from(config),
        config.stream_buffer,
    );
    broadcaster.start(config.interval()).await?;

    let state = AppState {
        broadcaster: broadcaster.clone(),
        lister: ProcessLister::new(Arc::clone(&sources.processes)),
        terminator: ProcessTerminator::default(),
    };

    let listener = match tokio::net::TcpListener::bind(&config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            broadcaster.stop().await;
            return Err(e.into());
        }
    };
    log::info!("Serving metrics on http://{}", listener.local_addr()?);

    let shutdown = {
        let broadcaster = broadcaster.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
            }
            log::info!("Shutting down");
            // ends every open stream so connections can drain
            broadcaster.stop().await;
        }
    };

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    broadcaster.stop().await;
    Ok(())
}

//! HTTP front-end for the gateway.
//!
//! `POST /compute` accepts one [`Action`] and always answers `200 OK`; the
//! outcome travels in the body as a [`ComputeResponse`]. `GET /config`
//! publishes the active limits so clients can pre-validate input.

#![expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! macro usage"
)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json,
    Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    action::Action,
    config::ServiceLimits,
    dispatch::translate,
    engine::Compute,
    error::StructuredError,
};

/// Limits as published to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedConfig {
    /// Active bounds and file limits.
    #[serde(flatten)]
    pub limits: ServiceLimits,
    /// Wall-clock ceiling for one engine run; zero means unbounded.
    pub max_execution_time_seconds: u64,
}

/// Body of every `/compute` reply.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ComputeResponse {
    /// The engine produced a payload.
    Success {
        /// Normalized engine output.
        data: String,
    },
    /// Validation or execution failed.
    Error {
        /// Serialized [`StructuredError`].
        error: Value,
    },
}

impl From<Result<String, StructuredError>> for ComputeResponse {
    fn from(outcome: Result<String, StructuredError>) -> Self {
        match outcome {
            Ok(data) => Self::Success { data },
            Err(err) => Self::Error {
                error: err.to_json_value(),
            },
        }
    }
}

/// Shared request state.
#[derive(Clone)]
pub struct AppState {
    published: Arc<PublishedConfig>,
    compute: Arc<dyn Compute>,
}

impl AppState {
    /// Bundle the resolved limits with the engine runner.
    #[must_use]
    pub fn new(published: PublishedConfig, compute: Arc<dyn Compute>) -> Self {
        Self {
            published: Arc::new(published),
            compute,
        }
    }

    /// Active bounds and file limits.
    #[must_use]
    pub fn limits(&self) -> &ServiceLimits { &self.published.limits }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/compute", post(compute))
        .route("/config", get(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn compute(
    State(state): State<AppState>,
    payload: Result<Json<Action>, JsonRejection>,
) -> Json<ComputeResponse> {
    let outcome = match payload {
        Ok(Json(action)) => run_action(&state, &action).await,
        Err(rejection) => Err(StructuredError::unknown(rejection.body_text())),
    };
    match &outcome {
        Err(err) if err.is_user_input() => info!(error_type = err.kind(), "compute request rejected"),
        Err(err) => warn!(error_type = err.kind(), "compute request failed"),
        Ok(_) => {}
    }
    Json(ComputeResponse::from(outcome))
}

async fn run_action(state: &AppState, action: &Action) -> Result<String, StructuredError> {
    let invocation = translate(action, state.limits())?;
    state.compute.compute(invocation).await
}

async fn config(State(state): State<AppState>) -> Json<PublishedConfig> { Json(*state.published) }

/// Serve the gateway on `listener` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error when the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "stvd listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    res = tokio::signal::ctrl_c() => {
                        if let Err(err) = res {
                            warn!(error = %err, "failed to listen for Ctrl-C");
                        }
                    },
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await;
    }
    info!("shutdown signal received");
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn success_envelope() {
        let body = serde_json::to_value(ComputeResponse::from(Ok("{}".to_owned()))).expect("json");
        assert_eq!(body, json!({"status": "success", "data": "{}"}));
    }

    #[rstest]
    fn error_envelope_embeds_structured_error() {
        let outcome = Err(StructuredError::MaxExecutionTimeExceeded);
        let body = serde_json::to_value(ComputeResponse::from(outcome)).expect("json");
        assert_eq!(
            body,
            json!({"status": "error", "error": {"type": "MaxExecutionTimeExceededError"}})
        );
    }

    #[rstest]
    fn published_config_flattens_limits() {
        let published = PublishedConfig {
            limits: ServiceLimits::default(),
            max_execution_time_seconds: 3,
        };
        let body = serde_json::to_value(published).expect("json");
        assert_eq!(body["maxExecutionTimeSeconds"], 3);
        assert_eq!(body["parameterizedModels"]["tianJi"]["max"]["horses"], 4);
        assert_eq!(body["fileModel"]["maxFileSizeBytes"], 262_144);
        assert_eq!(body["mappingFile"]["maxNumberOfMappings"], 100);
    }
}

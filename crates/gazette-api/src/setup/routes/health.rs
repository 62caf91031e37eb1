//! Health check handlers.

use crate::constants::READINESS_TIMEOUT_SECS;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use gazette_services::LegacyStore;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct ReadinessResponse {
    pub status: String,
    pub legacy_store: String,
}

/// Liveness check - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Open and close one legacy session.
async fn check_legacy(store: &dyn LegacyStore) -> Result<(), gazette_services::LegacyError> {
    let session = store.connect().await?;
    session.close().await
}

/// Readiness check. The primary source is per-URL and is not checked; an
/// unreachable legacy store means degraded fallback, reported as 503.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timeout = Duration::from_secs(READINESS_TIMEOUT_SECS);

    let legacy_store = match state.resolver.legacy_store() {
        Some(store) => run_check(timeout, check_legacy(store.as_ref()), "unreachable").await,
        None => "disabled".to_string(),
    };

    let ready = matches!(legacy_store.as_str(), "healthy" | "disabled");
    if !ready {
        tracing::warn!(legacy_store = %legacy_store, "Legacy store readiness check failed");
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "degraded" }.to_string(),
            legacy_store,
        }),
    )
}

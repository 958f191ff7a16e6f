use crate::{config::AppState, ctx::Caller, error::Result};
use axum::{extract::State, http::StatusCode};
use tracing::debug;

/// POST /status
///
/// Heartbeat that keeps the caller from being swept as inactive.
pub async fn heartbeat(State(state): State<AppState>, caller: Caller) -> Result<StatusCode> {
    debug!("POST /status - {}", caller.name());
    state.presence.heartbeat(caller.name()).await?;
    Ok(StatusCode::OK)
}

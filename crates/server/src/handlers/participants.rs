use crate::{
    config::AppState,
    error::{ChatError, Result},
    handlers::validate,
    models::{NewParticipantInput, Participant},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// POST /participants
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewParticipantInput>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(input) = body.map_err(|e| ChatError::InvalidInput(e.body_text()))?;
    let name = validate::name(input.name.as_deref())?;

    info!("POST /participants - {}", name);
    state.presence.register(&name).await?;

    Ok(StatusCode::CREATED)
}

/// GET /participants
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Participant>>> {
    let participants = state.presence.list().await?;
    Ok(Json(participants))
}

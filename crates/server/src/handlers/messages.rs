use crate::{
    config::AppState,
    ctx::Caller,
    error::{ChatError, Result},
    handlers::validate,
    messages::Limit,
    models::{Message, MessagesQuery, NewMessageInput},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// Confirmation body for a successful delete.
pub const DELETED_TEXT: &str = "Message deleted";

/// POST /messages
///
/// Sender comes from the `user` header. Unknown senders get 404.
pub async fn send(
    State(state): State<AppState>,
    caller: Caller,
    body: std::result::Result<Json<NewMessageInput>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(input) = body.map_err(|e| ChatError::InvalidInput(e.body_text()))?;
    let to = validate::required("to", input.to.as_deref())?;
    let text = validate::required("text", input.text.as_deref())?;
    let message_type = validate::client_message_type(input.message_type.as_deref())?;

    info!("POST /messages - {} -> {}", caller.name(), to);
    state
        .messages
        .append(caller.name(), &to, &text, message_type)
        .await?;

    Ok(StatusCode::CREATED)
}

/// GET /messages?limit=N
pub async fn feed(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>> {
    let limit = Limit::parse(query.limit.as_deref());
    let messages = state.messages.query(caller.name(), limit).await?;
    Ok(Json(messages))
}

/// DELETE /messages/{id}
pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<&'static str> {
    let id = validate::required("id", Some(id.as_str()))?;

    info!("DELETE /messages/{} - {}", id, caller.name());
    state.messages.delete_owned(&id, caller.name()).await?;

    Ok(DELETED_TEXT)
}

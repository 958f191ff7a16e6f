//! Request shape validation
//!
//! Runs in the handlers before any core call; the core only checks business
//! rules (uniqueness, existence, ownership).

use crate::error::{ChatError, Result};
use crate::models::MessageType;

pub const MAX_NAME_LEN: usize = 64;

/// A display name: non-blank, bounded, no control characters. Returned trimmed.
pub fn name(raw: Option<&str>) -> Result<String> {
    let name = required("name", raw)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ChatError::InvalidInput(format!(
            "name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ChatError::InvalidInput(
            "name must not contain control characters".into(),
        ));
    }
    Ok(name)
}

/// A required, non-blank string field. Returned trimmed.
pub fn required(field: &str, raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ChatError::InvalidInput(format!("{} is required", field))),
    }
}

/// Message kinds a client may post. Status events are server-generated only.
pub fn client_message_type(raw: Option<&str>) -> Result<MessageType> {
    let raw = required("type", raw)?;
    match raw.parse::<MessageType>() {
        Ok(kind @ (MessageType::Message | MessageType::PrivateMessage)) => Ok(kind),
        _ => Err(ChatError::InvalidInput(format!(
            "type must be message or private_message, got {}",
            raw
        ))),
    }
}

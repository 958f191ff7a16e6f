use crate::error::{ChatError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the caller's display name.
pub const USER_HEADER: &str = "user";

/// Identity of the participant making the request.
#[derive(Clone, Debug)]
pub struct Caller {
    name: String,
}

impl Caller {
    pub fn new(name: String) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .ok_or_else(|| ChatError::InvalidInput("missing user header".into()))?
            .to_str()
            .map_err(|_| ChatError::InvalidInput("user header is not valid text".into()))?;

        let name = raw.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidInput("user header is empty".into()));
        }
        Ok(Caller::new(name.to_string()))
    }
}

//! Message log
//!
//! Append-only ordered sequence of chat and status events, read back as a
//! per-viewer feed trimmed to its last `limit` entries.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ChatError, Result};
use crate::models::{Message, MessageType};
use crate::store::{ChatStore, DeleteOutcome};

/// How many trailing entries of the filtered feed to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    All,
    Last(usize),
}

impl Limit {
    /// Missing or non-numeric means everything; zero or negative means nothing.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
            None => Limit::All,
            Some(n) if n <= 0 => Limit::Last(0),
            Some(n) => Limit::Last(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }

    fn apply<T>(self, mut items: Vec<T>) -> Vec<T> {
        match self {
            Limit::All => items,
            Limit::Last(n) => {
                let skip = items.len().saturating_sub(n);
                items.split_off(skip)
            }
        }
    }
}

#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
}

impl MessageLog {
    pub fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a message from a registered participant.
    pub async fn append(
        &self,
        from: &str,
        to: &str,
        text: &str,
        message_type: MessageType,
    ) -> Result<Message> {
        if !self.store.participant_exists(from).await? {
            return Err(ChatError::NotFound(format!("participant {} not found", from)));
        }

        let message = Message {
            id: Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            text: text.to_string(),
            message_type,
            time: self.clock.time_label(),
        };
        self.store.insert_message(&message).await?;

        debug!("[Log] {} -> {} ({})", from, to, message_type);
        Ok(message)
    }

    /// Messages visible to `viewer`, in log order, trimmed to `limit`.
    pub async fn query(&self, viewer: &str, limit: Limit) -> Result<Vec<Message>> {
        let visible: Vec<Message> = self
            .store
            .list_messages()
            .await?
            .into_iter()
            .filter(|m| m.is_visible_to(viewer))
            .collect();
        Ok(limit.apply(visible))
    }

    /// Permanently remove `id` if `requester` sent it.
    pub async fn delete_owned(&self, id: &str, requester: &str) -> Result<()> {
        match self.store.delete_message_if_owned(id, requester).await? {
            DeleteOutcome::Deleted => {
                info!("[Log] {} deleted message {}", requester, id);
                Ok(())
            }
            DeleteOutcome::NotFound => {
                Err(ChatError::NotFound(format!("message {} not found", id)))
            }
            DeleteOutcome::NotOwner => Err(ChatError::Forbidden(format!(
                "message {} does not belong to {}",
                id, requester
            ))),
        }
    }
}

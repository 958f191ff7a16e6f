//! Presence tracker
//!
//! Registers display names, records heartbeats and lists who is online.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ChatError, Result};
use crate::models::{Message, Participant, JOIN_TEXT};
use crate::store::ChatStore;

#[derive(Clone)]
pub struct PresenceTracker {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
}

impl PresenceTracker {
    pub fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register `name` and announce it to the room.
    ///
    /// The insert and the join event are two separate writes. A failure
    /// between them leaves a registered participant without a join event.
    pub async fn register(&self, name: &str) -> Result<Participant> {
        let participant = Participant::new(name, self.clock.now_ms());
        self.store.insert_participant(&participant).await?;

        let joined = Message::status(
            Uuid::new_v4().to_string(),
            name,
            JOIN_TEXT,
            self.clock.time_label(),
        );
        if let Err(e) = self.store.insert_message(&joined).await {
            error!("[Presence] {} registered but join event failed: {}", name, e);
            return Err(e);
        }

        info!("[Presence] {} entered the room", name);
        Ok(participant)
    }

    pub async fn heartbeat(&self, name: &str) -> Result<()> {
        if self.store.touch_participant(name, self.clock.now_ms()).await? {
            Ok(())
        } else {
            Err(ChatError::NotFound(format!("participant {} not found", name)))
        }
    }

    pub async fn list(&self) -> Result<Vec<Participant>> {
        self.store.list_participants().await
    }
}

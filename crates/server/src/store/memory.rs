//! In-process store backed by tokio locks.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ChatStore, DeleteOutcome};
use crate::error::{ChatError, Result};
use crate::models::{Message, Participant};

#[derive(Default)]
pub struct MemoryStore {
    participants: RwLock<HashMap<String, Participant>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let mut participants = self.participants.write().await;
        if participants.contains_key(&participant.name) {
            return Err(ChatError::Conflict(format!(
                "participant {} already exists",
                participant.name
            )));
        }
        participants.insert(participant.name.clone(), participant.clone());
        Ok(())
    }

    async fn touch_participant(&self, name: &str, at: i64) -> Result<bool> {
        let mut participants = self.participants.write().await;
        match participants.get_mut(name) {
            Some(p) => {
                p.last_status = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn participant_exists(&self, name: &str) -> Result<bool> {
        Ok(self.participants.read().await.contains_key(name))
    }

    async fn list_participants(&self) -> Result<Vec<Participant>> {
        Ok(self.participants.read().await.values().cloned().collect())
    }

    async fn stale_participants(&self, cutoff: i64) -> Result<Vec<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .values()
            .filter(|p| p.last_status < cutoff)
            .cloned()
            .collect())
    }

    async fn delete_stale_participants(&self, cutoff: i64) -> Result<u64> {
        let mut participants = self.participants.write().await;
        let before = participants.len();
        participants.retain(|_, p| p.last_status >= cutoff);
        Ok((before - participants.len()) as u64)
    }

    async fn insert_message(&self, message: &Message) -> Result<()> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|m| m.id == message.id) {
            return Err(ChatError::Conflict(format!("message {} already exists", message.id)));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        Ok(self.messages.read().await.clone())
    }

    async fn delete_message_if_owned(&self, id: &str, owner: &str) -> Result<DeleteOutcome> {
        let mut messages = self.messages.write().await;
        let Some(idx) = messages.iter().position(|m| m.id == id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if messages[idx].from != owner {
            return Ok(DeleteOutcome::NotOwner);
        }
        messages.remove(idx);
        Ok(DeleteOutcome::Deleted)
    }

    async fn close(&self) {}
}

//! Store adapter
//!
//! CRUD over the `participants` and `messages` collections. Uniqueness of
//! participant names and ownership of message deletion are enforced by the
//! store itself, so callers never need a read-then-write.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Message, Participant};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Result of a compare-and-delete on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

#[async_trait]
pub trait ChatStore: Send + Sync + 'static {
    /// Insert a participant. Fails with `Conflict` if the name is taken.
    async fn insert_participant(&self, participant: &Participant) -> Result<()>;

    /// Set `last_status` for `name`. Returns `false` if no such participant.
    async fn touch_participant(&self, name: &str, at: i64) -> Result<bool>;

    async fn participant_exists(&self, name: &str) -> Result<bool>;

    async fn list_participants(&self) -> Result<Vec<Participant>>;

    /// Participants with `last_status < cutoff`.
    async fn stale_participants(&self, cutoff: i64) -> Result<Vec<Participant>>;

    /// Delete every participant with `last_status < cutoff`.
    async fn delete_stale_participants(&self, cutoff: i64) -> Result<u64>;

    /// Append a message at the end of the log.
    async fn insert_message(&self, message: &Message) -> Result<()>;

    /// Every message, in insertion order.
    async fn list_messages(&self) -> Result<Vec<Message>>;

    /// Delete `id` only if it was sent by `owner`.
    async fn delete_message_if_owned(&self, id: &str, owner: &str) -> Result<DeleteOutcome>;

    async fn close(&self);
}

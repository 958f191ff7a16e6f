//! SQLite-backed store
//!
//! The `participants.name` primary key gives an atomic unique insert and the
//! `seq` column carries the store-assigned message order.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{ChatStore, DeleteOutcome};
use crate::error::{ChatError, Result};
use crate::models::{Message, MessageType, Participant};

type MessageRow = (String, String, String, String, String, String);

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // Every connection to an in-memory database gets its own empty copy.
        let max_connections = if is_in_memory(url) { 1 } else { 8 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_db().await?;

        info!("[Store] SQLite store ready at {}", url);
        Ok(store)
    }

    async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS participants (
                name TEXT PRIMARY KEY NOT NULL,
                last_status INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                from_name TEXT NOT NULL,
                to_name TEXT NOT NULL,
                text TEXT NOT NULL,
                kind TEXT NOT NULL,
                time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_participants_last_status ON participants(last_status)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn message_from_row((id, from, to, text, kind, time): MessageRow) -> Result<Message> {
        let message_type = MessageType::from_str(&kind).map_err(ChatError::Store)?;
        Ok(Message {
            id,
            from,
            to,
            text,
            message_type,
            time,
        })
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        sqlx::query("INSERT INTO participants (name, last_status) VALUES (?, ?)")
            .bind(&participant.name)
            .bind(participant.last_status)
            .execute(&self.pool)
            .await
            .map_err(|e| match ChatError::from(e) {
                ChatError::Conflict(_) => ChatError::Conflict(format!(
                    "participant {} already exists",
                    participant.name
                )),
                other => other,
            })?;
        Ok(())
    }

    async fn touch_participant(&self, name: &str, at: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE participants SET last_status = ? WHERE name = ?")
            .bind(at)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn participant_exists(&self, name: &str) -> Result<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM participants WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, last_status FROM participants")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(name, last_status)| Participant { name, last_status })
            .collect())
    }

    async fn stale_participants(&self, cutoff: i64) -> Result<Vec<Participant>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, last_status FROM participants WHERE last_status < ?")
                .bind(cutoff)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(name, last_status)| Participant { name, last_status })
            .collect())
    }

    async fn delete_stale_participants(&self, cutoff: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM participants WHERE last_status < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_message(&self, message: &Message) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (id, from_name, to_name, text, kind, time) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.message_type.as_str())
        .bind(&message.time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, from_name, to_name, text, kind, time FROM messages ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::message_from_row).collect()
    }

    async fn delete_message_if_owned(&self, id: &str, owner: &str) -> Result<DeleteOutcome> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ? AND from_name = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            return Ok(DeleteOutcome::Deleted);
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if count == 0 {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::NotOwner)
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open(dir: &TempDir) -> SqliteStore {
        let url = format!("sqlite:{}", dir.path().join("chat.sqlite").display());
        SqliteStore::connect(&url).await.unwrap()
    }

    fn message(id: &str, from: &str, message_type: MessageType) -> Message {
        Message {
            id: id.into(),
            from: from.into(),
            to: "Todos".into(),
            text: format!("text {}", id),
            message_type,
            time: "08:30:00".into(),
        }
    }

    #[test]
    fn test_in_memory_url_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:chat?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:batepapo.sqlite"));
    }

    #[tokio::test]
    async fn test_in_memory_url_keeps_schema_across_queries() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();

        // Sequential queries must all see the tables created at connect.
        for i in 0..10 {
            store
                .insert_participant(&Participant::new(format!("user{}", i), i))
                .await
                .unwrap();
            store
                .insert_message(&message(&format!("m{}", i), "Ana", MessageType::Message))
                .await
                .unwrap();
        }
        assert_eq!(store.list_participants().await.unwrap().len(), 10);
        assert_eq!(store.list_messages().await.unwrap().len(), 10);
        store.close().await;
    }

    #[tokio::test]
    async fn test_unique_name_is_enforced() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;

        store.insert_participant(&Participant::new("Ana", 10)).await.unwrap();
        let err = store
            .insert_participant(&Participant::new("Ana", 20))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Conflict(_)));
        store.close().await;
    }

    #[tokio::test]
    async fn test_touch_and_sweep() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;

        store.insert_participant(&Participant::new("Ana", 10)).await.unwrap();
        store.insert_participant(&Participant::new("Bob", 10)).await.unwrap();
        assert!(store.touch_participant("Bob", 500).await.unwrap());
        assert!(!store.touch_participant("Carla", 500).await.unwrap());

        let stale = store.stale_participants(100).await.unwrap();
        assert_eq!(stale, vec![Participant::new("Ana", 10)]);
        assert_eq!(store.delete_stale_participants(100).await.unwrap(), 1);
        assert_eq!(
            store.list_participants().await.unwrap(),
            vec![Participant::new("Bob", 500)]
        );
        store.close().await;
    }

    #[tokio::test]
    async fn test_messages_persist_in_order() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir).await;
            store.insert_message(&message("z", "Ana", MessageType::Status)).await.unwrap();
            store.insert_message(&message("a", "Bob", MessageType::PrivateMessage)).await.unwrap();
            store.close().await;
        }

        let store = open(&dir).await;
        let messages = store.list_messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "z");
        assert_eq!(messages[0].message_type, MessageType::Status);
        assert_eq!(messages[1].message_type, MessageType::PrivateMessage);
        assert_eq!(messages[1].from, "Bob");
        store.close().await;
    }

    #[tokio::test]
    async fn test_delete_distinguishes_missing_and_foreign() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        store.insert_message(&message("m1", "Ana", MessageType::Message)).await.unwrap();

        assert_eq!(
            store.delete_message_if_owned("m1", "Bob").await.unwrap(),
            DeleteOutcome::NotOwner
        );
        assert_eq!(
            store.delete_message_if_owned("m1", "Ana").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete_message_if_owned("m1", "Ana").await.unwrap(),
            DeleteOutcome::NotFound
        );
        assert!(store.list_messages().await.unwrap().is_empty());
        store.close().await;
    }
}

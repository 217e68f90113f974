// ABOUTME: Message storage layer using SQLite
// ABOUTME: The persisted row is the durable record; broadcast happens after the write

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;

use tandem_core::generate_id;
use tandem_storage::StorageError;

use super::types::{Message, MessageCreateInput};

/// Message storage errors
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Message not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type MessageResult<T> = Result<T, MessageError>;

pub struct MessageStorage {
    pool: SqlitePool,
}

impl MessageStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_message(
        &self,
        sender_id: &str,
        input: MessageCreateInput,
    ) -> MessageResult<Message> {
        if input.body.trim().is_empty() {
            return Err(MessageError::Validation("Message body is required".to_string()));
        }
        if input.receiver_id.trim().is_empty() {
            return Err(MessageError::Validation("Receiver is required".to_string()));
        }

        let id = generate_id();
        let now = Utc::now();
        let message_type = input.message_type.unwrap_or_else(|| "text".to_string());

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, project_id, sender_id, receiver_id, body, message_type, is_read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.project_id)
        .bind(sender_id)
        .bind(&input.receiver_id)
        .bind(&input.body)
        .bind(&message_type)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Created message {} from {} to {}", id, sender_id, input.receiver_id);
        self.get_message(&id).await
    }

    pub async fn get_message(&self, message_id: &str) -> MessageResult<Message> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| MessageError::NotFound(message_id.to_string()))?;

        Self::row_to_message(&row)
    }

    /// Messages addressed to a user, newest first.
    pub async fn list_inbox(&self, user_id: &str) -> MessageResult<Vec<Message>> {
        let rows = sqlx::query("SELECT * FROM messages WHERE receiver_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.rows_to_messages(rows)
    }

    /// The full exchange between two users, oldest first.
    pub async fn list_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> MessageResult<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM messages
            WHERE (sender_id = ? AND receiver_id = ?)
               OR (sender_id = ? AND receiver_id = ?)
            ORDER BY created_at
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.rows_to_messages(rows)
    }

    /// Messages scoped to a project, oldest first.
    pub async fn list_project_messages(&self, project_id: &str) -> MessageResult<Vec<Message>> {
        let rows = sqlx::query("SELECT * FROM messages WHERE project_id = ? ORDER BY created_at")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.rows_to_messages(rows)
    }

    pub async fn unread_count(&self, user_id: &str) -> MessageResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND is_read = 0")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
        Ok(count)
    }

    /// Mark a message read, stamping `read_at` on the first call only.
    pub async fn mark_read(&self, message_id: &str) -> MessageResult<Message> {
        let message = self.get_message(message_id).await?;
        if message.is_read {
            return Ok(message);
        }

        sqlx::query("UPDATE messages SET is_read = 1, read_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.get_message(message_id).await
    }

    fn rows_to_messages(&self, rows: Vec<SqliteRow>) -> MessageResult<Vec<Message>> {
        let mut messages = Vec::new();
        for row in rows {
            messages.push(Self::row_to_message(&row)?);
        }
        Ok(messages)
    }

    fn row_to_message(row: &SqliteRow) -> MessageResult<Message> {
        let read_at: Option<String> = row.try_get("read_at").map_err(StorageError::Sqlx)?;
        let read_at = match read_at {
            Some(s) => Some(
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| StorageError::Database("Invalid read_at timestamp".to_string()))?,
            ),
            None => None,
        };

        let created_at_str: String = row.try_get("created_at").map_err(StorageError::Sqlx)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| StorageError::Database("Invalid created_at timestamp".to_string()))?;

        Ok(Message {
            id: row.try_get("id").map_err(StorageError::Sqlx)?,
            project_id: row.try_get("project_id").map_err(StorageError::Sqlx)?,
            sender_id: row.try_get("sender_id").map_err(StorageError::Sqlx)?,
            receiver_id: row.try_get("receiver_id").map_err(StorageError::Sqlx)?,
            body: row.try_get("body").map_err(StorageError::Sqlx)?,
            message_type: row.try_get("message_type").map_err(StorageError::Sqlx)?,
            is_read: row.try_get::<i64, _>("is_read").map_err(StorageError::Sqlx)? != 0,
            read_at,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_storage() -> MessageStorage {
        let pool = tandem_storage::connect_in_memory().await.unwrap();
        MessageStorage::new(pool)
    }

    fn to_user(receiver: &str, body: &str) -> MessageCreateInput {
        MessageCreateInput {
            project_id: None,
            receiver_id: receiver.to_string(),
            body: body.to_string(),
            message_type: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_inbox() {
        let storage = create_test_storage().await;

        storage.create_message("u1", to_user("u2", "first")).await.unwrap();
        storage.create_message("u1", to_user("u2", "second")).await.unwrap();
        storage.create_message("u1", to_user("u3", "other")).await.unwrap();

        let inbox = storage.list_inbox("u2").await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].body, "second");
        assert_eq!(storage.unread_count("u2").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_conversation_is_bidirectional() {
        let storage = create_test_storage().await;

        storage.create_message("u1", to_user("u2", "hi")).await.unwrap();
        storage.create_message("u2", to_user("u1", "hello")).await.unwrap();
        storage.create_message("u3", to_user("u1", "unrelated")).await.unwrap();

        let conversation = storage.list_conversation("u1", "u2").await.unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].body, "hi");
        assert_eq!(conversation[1].body, "hello");
    }

    #[tokio::test]
    async fn test_mark_read_stamps_once() {
        let storage = create_test_storage().await;
        let message = storage.create_message("u1", to_user("u2", "hi")).await.unwrap();
        assert!(!message.is_read);

        let read = storage.mark_read(&message.id).await.unwrap();
        assert!(read.is_read);
        let first_read_at = read.read_at.unwrap();

        let again = storage.mark_read(&message.id).await.unwrap();
        assert_eq!(again.read_at.unwrap(), first_read_at);

        assert_eq!(storage.unread_count("u2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let storage = create_test_storage().await;
        let result = storage.create_message("u1", to_user("u2", "  ")).await;
        assert!(matches!(result.unwrap_err(), MessageError::Validation(_)));
    }
}

//! Message repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sms_manager_core::{ContactId, MessageBody, MessageId, MessageStatus, PhoneNumber};

use super::{MessageStore, RepositoryError};
use crate::models::{Message, MessageView, NewMessage};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    sender_id: i32,
    receiver_id: Option<i32>,
    message: String,
    status: MessageStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let body = MessageBody::parse(&row.message).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid message {} in database: {e}", row.id))
        })?;

        Ok(Self {
            id: MessageId::new(row.id),
            sender_id: ContactId::new(row.sender_id),
            receiver_id: row.receiver_id.map(ContactId::new),
            body,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A message joined with the numbers of its sender and receiver.
#[derive(Debug, sqlx::FromRow)]
struct MessageViewRow {
    id: i32,
    status: MessageStatus,
    sender: PhoneNumber,
    receiver: Option<PhoneNumber>,
    created_at: DateTime<Utc>,
    message: String,
}

impl From<MessageViewRow> for MessageView {
    fn from(row: MessageViewRow) -> Self {
        Self {
            id: MessageId::new(row.id),
            status: row.status,
            sender: row.sender,
            receiver: row.receiver,
            created_at: row.created_at,
            message: row.message,
        }
    }
}

const SELECT_VIEW: &str = r"
    SELECT m.id, m.status, s.number AS sender, r.number AS receiver,
           m.created_at, m.message
    FROM messages m
    JOIN contacts s ON s.id = m.sender_id
    LEFT JOIN contacts r ON r.id = m.receiver_id
";

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` implementation of [`MessageStore`].
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r"
            INSERT INTO messages (sender_id, receiver_id, message, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id, sender_id, receiver_id, message, status, created_at, updated_at
            ",
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.body.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find(&self, id: MessageId) -> Result<Option<MessageView>, RepositoryError> {
        let row = sqlx::query_as::<_, MessageViewRow>(&format!("{SELECT_VIEW} WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<MessageView>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageViewRow>(&format!("{SELECT_VIEW} ORDER BY m.id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn finalize_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

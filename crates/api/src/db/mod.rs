//! Persistence for users, contacts and messages.
//!
//! ## Tables
//!
//! - `users` - Accounts allowed to sign in (created by the CLI only)
//! - `contacts` - Phone book entries, unique on `number`
//! - `messages` - SMS records; `sender_id` cascades on contact delete,
//!   `receiver_id` is set to NULL
//!
//! Each table is reached through a store trait so handlers can run against
//! `PostgreSQL` in production and [`MemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p sms-manager-cli -- migrate
//! ```

pub mod contacts;
pub mod memory;
pub mod messages;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use sms_manager_core::{Email, MessageId, MessageStatus, PhoneNumber, UserId};

use crate::models::{Contact, Message, MessageView, NewContact, NewMessage, NewUser, User};

pub use contacts::ContactRepository;
pub use memory::MemoryStore;
pub use messages::MessageRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Access to the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Look up a user matching both the id and the email carried by a token.
    async fn find_by_id_and_email(
        &self,
        id: UserId,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
}

/// Access to the `contacts` table.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Insert the contact unless its number already exists.
    ///
    /// Returns the stored row and `true` when it was created by this call.
    async fn find_or_create(&self, contact: NewContact)
    -> Result<(Contact, bool), RepositoryError>;

    async fn find_by_number(&self, number: &PhoneNumber)
    -> Result<Option<Contact>, RepositoryError>;

    /// All contacts ordered by id.
    async fn list(&self) -> Result<Vec<Contact>, RepositoryError>;

    /// Returns `false` when no contact had that number.
    async fn delete_by_number(&self, number: &PhoneNumber) -> Result<bool, RepositoryError>;
}

/// Access to the `messages` table.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message with status `pending`.
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    async fn find(&self, id: MessageId) -> Result<Option<MessageView>, RepositoryError>;

    /// All messages ordered by id.
    async fn list(&self) -> Result<Vec<MessageView>, RepositoryError>;

    /// Returns `false` when no message had that id.
    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError>;

    /// Move a pending message to `status`.
    ///
    /// Returns `false` if the message is gone or already finalised; a
    /// finalised status is never overwritten.
    async fn finalize_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<bool, RepositoryError>;
}

/// The set of stores handed to application state.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub messages: Arc<dyn MessageStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            contacts: Arc::new(ContactRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Stores sharing one in-memory backend.
    #[must_use]
    pub fn in_memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            contacts: Arc::new(store.clone()),
            messages: Arc::new(store.clone()),
            pool: None,
        }
    }

    /// Check that the backing database answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to `RepositoryError::Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

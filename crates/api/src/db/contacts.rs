//! Contact repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sms_manager_core::{ContactId, PhoneNumber};

use super::{ContactStore, RepositoryError};
use crate::models::{Contact, NewContact};

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i32,
    firstname: String,
    lastname: Option<String>,
    number: PhoneNumber,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            id: ContactId::new(row.id),
            firstname: row.firstname,
            lastname: row.lastname,
            number: row.number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` implementation of [`ContactStore`].
#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for ContactRepository {
    async fn find_or_create(
        &self,
        contact: NewContact,
    ) -> Result<(Contact, bool), RepositoryError> {
        // ON CONFLICT DO NOTHING returns no row when the number is taken.
        let inserted = sqlx::query_as::<_, ContactRow>(
            r"
            INSERT INTO contacts (firstname, lastname, number)
            VALUES ($1, $2, $3)
            ON CONFLICT (number) DO NOTHING
            RETURNING id, firstname, lastname, number, created_at, updated_at
            ",
        )
        .bind(contact.firstname.as_str())
        .bind(contact.lastname.as_ref().map(|l| l.as_str()))
        .bind(&contact.number)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let existing = self.find_by_number(&contact.number).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "contact {} conflicted on insert but could not be read back",
                contact.number
            ))
        })?;

        Ok((existing, false))
    }

    async fn find_by_number(
        &self,
        number: &PhoneNumber,
    ) -> Result<Option<Contact>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r"
            SELECT id, firstname, lastname, number, created_at, updated_at
            FROM contacts
            WHERE number = $1
            ",
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Contact>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r"
            SELECT id, firstname, lastname, number, created_at, updated_at
            FROM contacts
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_by_number(&self, number: &PhoneNumber) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contacts WHERE number = $1")
            .bind(number)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

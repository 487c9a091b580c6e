//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sms_manager_core::{Email, PersonName, UserId};

/// A user allowed to sign in (domain type).
///
/// Users are only ever created by the CLI, never through the API.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub firstname: String,
    pub lastname: Option<String>,
    /// Stored lowercased.
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: PersonName,
    pub lastname: Option<PersonName>,
    pub email: Email,
    pub password_hash: String,
}

/// Public view of a user returned from sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub firstname: String,
    pub lastname: Option<String>,
    pub email: Email,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
        }
    }
}

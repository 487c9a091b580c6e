//! Contact domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sms_manager_core::{ContactId, PersonName, PhoneNumber};

/// A stored contact.
///
/// Serializes as `{id, firstname, lastname, number, createdAt}`; the update
/// timestamp is kept internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub firstname: String,
    pub lastname: Option<String>,
    pub number: PhoneNumber,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a contact.
///
/// Deserializing trims every field and enforces the name and number rules.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub firstname: PersonName,
    #[serde(default)]
    pub lastname: Option<PersonName>,
    pub number: PhoneNumber,
}

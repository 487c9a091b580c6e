//! Message domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sms_manager_core::{ContactId, MessageBody, MessageId, MessageStatus, PhoneNumber};

/// A stored message as the delivery worker sees it.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: ContactId,
    /// `None` once the receiving contact has been deleted.
    pub receiver_id: Option<ContactId>,
    pub body: MessageBody,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a message; status always starts as pending.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: ContactId,
    pub receiver_id: ContactId,
    pub body: MessageBody,
}

/// A message joined with its sender and receiver numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub status: MessageStatus,
    pub sender: PhoneNumber,
    pub receiver: Option<PhoneNumber>,
    pub created_at: DateTime<Utc>,
    pub message: String,
}

impl MessageView {
    /// Build the view for a freshly created message from the numbers the
    /// caller supplied.
    #[must_use]
    pub fn from_created(message: Message, sender: PhoneNumber, receiver: PhoneNumber) -> Self {
        Self {
            id: message.id,
            status: message.status,
            sender,
            receiver: Some(receiver),
            created_at: message.created_at,
            message: message.body.into_inner(),
        }
    }
}

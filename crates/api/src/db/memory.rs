//! In-memory store with the same semantics as the `PostgreSQL` repositories.
//!
//! Used by unit and HTTP tests so they run without a database. Foreign key
//! behaviour is emulated: deleting a contact removes the messages it sent and
//! clears the receiver of the messages it received.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use sms_manager_core::{ContactId, Email, MessageId, MessageStatus, PhoneNumber, UserId};

use super::{ContactStore, MessageStore, RepositoryError, UserStore};
use crate::models::{Contact, Message, MessageView, NewContact, NewMessage, NewUser, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    contacts: BTreeMap<i32, Contact>,
    messages: BTreeMap<i32, Message>,
    last_user_id: i32,
    last_contact_id: i32,
    last_message_id: i32,
}

impl Tables {
    fn contact_number(&self, id: ContactId) -> Option<PhoneNumber> {
        self.contacts.get(&id.as_i32()).map(|c| c.number.clone())
    }

    fn view(&self, message: &Message) -> Option<MessageView> {
        // inner join on sender, left join on receiver
        let sender = self.contact_number(message.sender_id)?;
        let receiver = message.receiver_id.and_then(|id| self.contact_number(id));

        Some(MessageView {
            id: message.id,
            status: message.status,
            sender,
            receiver,
            created_at: message.created_at,
            message: message.body.as_str().to_owned(),
        })
    }
}

/// Shared in-memory backend implementing every store trait.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_id_and_email(
        &self,
        id: UserId,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .get(&id.as_i32())
            .filter(|u| &u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.last_user_id += 1;
        let created = User {
            id: UserId::new(tables.last_user_id),
            firstname: user.firstname.into_inner(),
            lastname: user.lastname.map(|l| l.into_inner()),
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id.as_i32(), created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn find_or_create(
        &self,
        contact: NewContact,
    ) -> Result<(Contact, bool), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.contacts.values().find(|c| c.number == contact.number) {
            return Ok((existing.clone(), false));
        }

        tables.last_contact_id += 1;
        let now = Utc::now();
        let created = Contact {
            id: ContactId::new(tables.last_contact_id),
            firstname: contact.firstname.into_inner(),
            lastname: contact.lastname.map(|l| l.into_inner()),
            number: contact.number,
            created_at: now,
            updated_at: now,
        };
        tables.contacts.insert(created.id.as_i32(), created.clone());
        Ok((created, true))
    }

    async fn find_by_number(
        &self,
        number: &PhoneNumber,
    ) -> Result<Option<Contact>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.contacts.values().find(|c| &c.number == number).cloned())
    }

    async fn list(&self) -> Result<Vec<Contact>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.contacts.values().cloned().collect())
    }

    async fn delete_by_number(&self, number: &PhoneNumber) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(id) = tables
            .contacts
            .values()
            .find(|c| &c.number == number)
            .map(|c| c.id)
        else {
            return Ok(false);
        };

        tables.contacts.remove(&id.as_i32());
        tables.messages.retain(|_, m| m.sender_id != id);
        for message in tables.messages.values_mut() {
            if message.receiver_id == Some(id) {
                message.receiver_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut tables = self.tables.lock().await;
        for id in [message.sender_id, message.receiver_id] {
            if !tables.contacts.contains_key(&id.as_i32()) {
                return Err(RepositoryError::Conflict(format!(
                    "contact {id} does not exist"
                )));
            }
        }

        tables.last_message_id += 1;
        let now = Utc::now();
        let created = Message {
            id: MessageId::new(tables.last_message_id),
            sender_id: message.sender_id,
            receiver_id: Some(message.receiver_id),
            body: message.body,
            status: MessageStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.messages.insert(created.id.as_i32(), created.clone());
        Ok(created)
    }

    async fn find(&self, id: MessageId) -> Result<Option<MessageView>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .get(&id.as_i32())
            .and_then(|m| tables.view(m)))
    }

    async fn list(&self) -> Result<Vec<MessageView>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .values()
            .filter_map(|m| tables.view(m))
            .collect())
    }

    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.messages.remove(&id.as_i32()).is_some())
    }

    async fn finalize_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.messages.get_mut(&id.as_i32()) {
            Some(message) if message.status == MessageStatus::Pending => {
                message.status = status;
                message.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::{ContactStore, MessageStore, Stores, UserStore};
use crate::services::{AuthService, DeliveryHandle};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    stores: Stores,
    auth: AuthService,
    delivery: DeliveryHandle,
}

impl AppState {
    #[must_use]
    pub fn new(stores: Stores, auth: AuthService, delivery: DeliveryHandle) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                stores,
                auth,
                delivery,
            }),
        }
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.stores.users.as_ref()
    }

    #[must_use]
    pub fn contacts(&self) -> &dyn ContactStore {
        self.inner.stores.contacts.as_ref()
    }

    #[must_use]
    pub fn messages(&self) -> &dyn MessageStore {
        self.inner.stores.messages.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn delivery(&self) -> &DeliveryHandle {
        &self.inner.delivery
    }
}

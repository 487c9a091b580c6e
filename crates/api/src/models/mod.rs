//! Domain models for the SMS manager API.
//!
//! Row types stay private to the `db` module; these are the validated
//! shapes handlers and services work with.

pub mod contact;
pub mod message;
pub mod user;

pub use contact::{Contact, NewContact};
pub use message::{Message, MessageView, NewMessage};
pub use user::{NewUser, User, UserProfile};

//! Validated domain values.

mod column;

pub mod body;
pub mod email;
pub mod id;
pub mod name;
pub mod phone;
pub mod status;

pub use body::{MessageBody, MessageBodyError};
pub use email::{Email, EmailError};
pub use id::*;
pub use name::{PersonName, PersonNameError};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use status::*;

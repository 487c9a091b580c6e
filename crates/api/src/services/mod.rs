//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password sign-in, JWT issuance and validation, user creation
//! - `delivery` - Background worker simulating SMS delivery

pub mod auth;
pub mod delivery;

pub use auth::{AuthError, AuthService, Identity, TokenService};
pub use delivery::{DeliveryHandle, DeliverySimulator};

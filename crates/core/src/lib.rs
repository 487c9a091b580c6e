//! SMS Manager Core - Shared domain types.
//!
//! This crate provides the types used across the SMS Manager components:
//! - `api` - The REST service (contacts, messages, sign-in)
//! - `cli` - Command-line tools for migrations and admin seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! database access, no HTTP. Field normalisation (trimming numbers and names,
//! lowercasing emails) happens here, before anything reaches persistence.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, phone numbers, names,
//!   message bodies and message statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Declarative request validation.
//!
//! Each payload type declares a static [`Schema`]. The [`ValidatedJson`] and
//! [`ValidatedPath`] extractors run the schema over the raw JSON first, so the
//! client gets every problem grouped by field, and only then deserialize into
//! the typed payload (where the core types trim and normalise).

use std::collections::{BTreeMap, HashMap};

use axum::{
    body::Bytes,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        path::ErrorKind,
        rejection::{BytesRejection, PathRejection},
    },
    http::{StatusCode, request::Parts},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use sms_manager_core::{Email, PersonName, PhoneNumber};

use crate::error::AppError;

/// Message returned when a body is not a JSON object.
pub const INVALID_JSON: &str = "Invalid request payload JSON format";

pub const PAYLOAD_TOO_LARGE: &str = "Request payload is too large";

/// A single check applied to a field value.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Email,
    MinLength(usize),
    MaxLength(usize),
    Pattern(fn(&str) -> bool),
    /// Accepts a JSON number or numeric string that fits in an `i32`.
    Integer,
}

/// One field of a [`Schema`].
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    pub rules: &'static [Rule],
    /// Replaces every message for this field when set.
    pub message: Option<&'static str>,
}

impl Field {
    #[must_use]
    pub const fn required(name: &'static str, rules: &'static [Rule]) -> Self {
        Self {
            name,
            required: true,
            rules,
            message: None,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, rules: &'static [Rule]) -> Self {
        Self {
            name,
            required: false,
            rules,
            message: None,
        }
    }

    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Message for a value that never reached the rules, such as a path
    /// segment that is not valid UTF-8.
    fn unreadable(&self) -> String {
        let name = self.name;
        match self.message {
            Some(message) => message.to_owned(),
            None if self.is_integer() => format!("\"{name}\" must be a number"),
            None => format!("\"{name}\" must be a string"),
        }
    }

    fn is_integer(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Integer))
    }

    /// Check `value`, coercing integer fields in place.
    fn check(&self, value: Option<&mut Value>) -> Vec<String> {
        let name = self.name;
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return if self.required {
                vec![format!("\"{name}\" is required")]
            } else {
                Vec::new()
            };
        };

        if self.is_integer() {
            let parsed = match &*value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .and_then(|n| i32::try_from(n).ok());

            return match parsed {
                Some(n) => {
                    *value = Value::from(n);
                    Vec::new()
                }
                None => vec![format!("\"{name}\" must be a number")],
            };
        }

        let Value::String(s) = &*value else {
            return vec![format!("\"{name}\" must be a string")];
        };

        let mut problems = Vec::new();
        if s.is_empty() {
            problems.push(format!("\"{name}\" is not allowed to be empty"));
        }
        for rule in self.rules {
            match *rule {
                Rule::Email if Email::parse(s).is_err() => {
                    problems.push(format!("\"{name}\" must be a valid email"));
                }
                Rule::MinLength(min) if s.chars().count() < min => problems.push(format!(
                    "\"{name}\" length must be at least {min} characters long"
                )),
                Rule::MaxLength(max) if s.chars().count() > max => problems.push(format!(
                    "\"{name}\" length must be less than or equal to {max} characters long"
                )),
                Rule::Pattern(accepts) if !accepts(s) => problems.push(format!(
                    "\"{name}\" with value \"{s}\" fails to match the required pattern"
                )),
                _ => {}
            }
        }
        problems
    }
}

/// Field set accepted by one payload.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub fields: &'static [Field],
}

impl Schema {
    /// Validate a JSON object in place.
    ///
    /// # Errors
    ///
    /// Returns every failed check grouped by field.
    pub fn validate(&self, input: &mut Map<String, Value>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        for key in input.keys() {
            if !self.fields.iter().any(|f| f.name == key) {
                errors.push(key, format!("\"{key}\" is not allowed"));
            }
        }

        for field in self.fields {
            let problems = field.check(input.get_mut(field.name));
            if problems.is_empty() {
                continue;
            }
            match field.message {
                Some(message) => errors.push(field.name, message),
                None => problems
                    .into_iter()
                    .for_each(|p| errors.push(field.name, p)),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Errors for an input field whose raw value could not be decoded.
    #[must_use]
    pub fn unreadable(&self, key: &str) -> FieldErrors {
        let mut errors = FieldErrors::default();
        match self.fields.iter().find(|f| f.name == key) {
            Some(field) => errors.push(key, field.unreadable()),
            None => errors.push(key, format!("\"{key}\" is not allowed")),
        }
        errors
    }
}

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// A payload with a declared schema.
pub trait Validate: DeserializeOwned {
    const SCHEMA: Schema;

    /// Run the schema over `value` and deserialize it.
    ///
    /// # Errors
    ///
    /// `BadRequest` when `value` is not an object, `Validation` when any
    /// field fails.
    fn from_json(value: Value) -> Result<Self, AppError> {
        let Value::Object(mut map) = value else {
            return Err(AppError::BadRequest(INVALID_JSON.to_owned()));
        };
        Self::SCHEMA.validate(&mut map).map_err(AppError::Validation)?;
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            tracing::debug!(error = %e, "validated payload failed to deserialize");
            AppError::BadRequest(INVALID_JSON.to_owned())
        })
    }
}

/// JSON body extractor that validates against `T::SCHEMA`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(body_rejection)?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|_| AppError::BadRequest(INVALID_JSON.to_owned()))?;
        T::from_json(value).map(Self)
    }
}

/// Path parameter extractor that validates against `T::SCHEMA`.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| path_rejection(&T::SCHEMA, rejection))?;
        let map = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<_, _>>();
        T::from_json(Value::Object(map)).map(Self)
    }
}

fn body_rejection(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(PAYLOAD_TOO_LARGE.to_owned())
    } else {
        tracing::debug!(error = %rejection, "request body could not be read");
        AppError::BadRequest(INVALID_JSON.to_owned())
    }
}

fn path_rejection(schema: &Schema, rejection: PathRejection) -> AppError {
    if let PathRejection::FailedToDeserializePathParams(failed) = &rejection
        && let ErrorKind::InvalidUtf8InPathParam { key, .. } = failed.kind()
    {
        return AppError::Validation(schema.unreadable(key));
    }
    // Any other rejection means the handler and its route disagree.
    AppError::Internal(format!("path extraction failed: {rejection}"))
}

/// Names are matched as sent, so a leading space or an overlong padded
/// value fails. Trailing spaces pass and are trimmed before storage.
pub fn is_person_name(s: &str) -> bool {
    s.chars().count() <= PersonName::MAX_LENGTH
        && s.starts_with(|c: char| c.is_ascii_alphabetic())
        && PersonName::parse(s).is_ok()
}

/// Numbers are matched as sent: no surrounding whitespace.
pub fn is_phone_number(s: &str) -> bool {
    s.trim() == s && PhoneNumber::parse(s).is_ok()
}

pub const FIRSTNAME_MESSAGE: &str = "\"firstname\" is required and must start with a letter, can have spaces, fullstops or hyphens and be 3 - 40 characters long";
pub const LASTNAME_MESSAGE: &str = "\"lastname\" must start with a letter, can have spaces, fullstops or hyphens and be 3 - 40 characters long";
pub const NUMBER_MESSAGE: &str = "\"number\" is required and must contain numbers, be at least 3 - 14 characters long and can start with a +";
pub const SENDER_MESSAGE: &str = "\"sender\" is required and must contain numbers, be at least 3 - 14 characters long and can start with a +";
pub const RECEIVER_MESSAGE: &str = "\"receiver\" is required and must contain numbers, be at least 3 - 14 characters long and can start with a +";

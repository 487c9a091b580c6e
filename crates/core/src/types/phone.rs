//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::column::pg_column;

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number must have between {min} and {max} digits")]
    DigitCount { min: usize, max: usize },
    #[error("phone number may only contain digits after a leading +")]
    InvalidCharacter,
}

/// A contact phone number.
///
/// Surrounding whitespace is trimmed. The remainder is any number of
/// leading `+` signs followed by 3 to 14 ASCII digits.
///
/// ```
/// use sms_manager_core::PhoneNumber;
///
/// assert_eq!(PhoneNumber::parse(" +2348012345678 ").unwrap().as_str(), "+2348012345678");
/// assert!(PhoneNumber::parse("12").is_err());
/// assert!(PhoneNumber::parse("080-1234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const MIN_DIGITS: usize = 3;
    pub const MAX_DIGITS: usize = 14;

    /// Parse and trim a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, contains anything
    /// other than leading `+` signs and digits, or has the wrong number of
    /// digits.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let digits = trimmed.trim_start_matches('+');
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::InvalidCharacter);
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneNumberError::DigitCount {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pg_column!(PhoneNumber => String);

//! Person name type used for user and contact first/last names.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PersonNameError {
    #[error("name must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("name must start with a letter")]
    LeadingCharacter,
    #[error("name may only contain letters, spaces, full stops and hyphens")]
    InvalidCharacter,
}

/// A trimmed first or last name.
///
/// Starts with an ASCII letter and continues with 2 to 39 letters,
/// spaces, full stops or hyphens.
///
/// ```
/// use sms_manager_core::PersonName;
///
/// assert_eq!(PersonName::parse("  Mary-Jane ").unwrap().as_str(), "Mary-Jane");
/// assert!(PersonName::parse("Al").is_err());
/// assert!(PersonName::parse("9lives").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 40;

    /// Parse and trim a name.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input has the wrong length, does not
    /// start with a letter, or contains a disallowed character.
    pub fn parse(s: &str) -> Result<Self, PersonNameError> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let first = chars.next().ok_or(PersonNameError::Length {
            min: Self::MIN_LENGTH,
            max: Self::MAX_LENGTH,
        })?;
        if !first.is_ascii_alphabetic() {
            return Err(PersonNameError::LeadingCharacter);
        }

        if !chars.all(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '.' | '-')) {
            return Err(PersonNameError::InvalidCharacter);
        }

        // all ASCII at this point, so byte length equals char count
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&trimmed.len()) {
            return Err(PersonNameError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
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

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PersonName {
    type Err = PersonNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PersonName {
    type Error = PersonNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PersonName> for String {
    fn from(value: PersonName) -> Self {
        value.0
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(PersonName::parse("Ada").is_ok());
        assert!(PersonName::parse("John Paul").is_ok());
        assert!(PersonName::parse("St. John-Smith").is_ok());
        assert!(PersonName::parse(&"a".repeat(40)).is_ok());
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(PersonName::parse("  Grace \t").unwrap().as_str(), "Grace");
    }

    #[test]
    fn test_parse_length_bounds() {
        assert!(matches!(
            PersonName::parse(""),
            Err(PersonNameError::Length { .. })
        ));
        assert!(matches!(
            PersonName::parse("Jo"),
            Err(PersonNameError::Length { .. })
        ));
        assert!(matches!(
            PersonName::parse(&"a".repeat(41)),
            Err(PersonNameError::Length { .. })
        ));
    }

    #[test]
    fn test_parse_leading_character() {
        assert_eq!(
            PersonName::parse("-Ada"),
            Err(PersonNameError::LeadingCharacter)
        );
        assert_eq!(
            PersonName::parse("1Ada"),
            Err(PersonNameError::LeadingCharacter)
        );
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(
            PersonName::parse("Ada_Lovelace"),
            Err(PersonNameError::InvalidCharacter)
        );
        assert_eq!(
            PersonName::parse("Zoë Smith"),
            Err(PersonNameError::InvalidCharacter)
        );
    }
}

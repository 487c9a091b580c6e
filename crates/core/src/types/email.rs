//! Sign-in email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::column::pg_column;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is blank")]
    Empty,
    #[error("email is longer than {max} characters")]
    TooLong { max: usize },
    #[error("email needs a single @ between user and domain")]
    MissingAtSymbol,
    #[error("email has nothing before the @")]
    EmptyLocalPart,
    #[error("email domain must be a dotted host name")]
    InvalidDomain,
    #[error("email contains whitespace")]
    Whitespace,
}

/// A user's email, stored lowercase.
///
/// Lowercasing at parse time keeps sign-in case-insensitive and lets the
/// unique index on `users.email` do its job.
///
/// ```
/// use sms_manager_core::Email;
///
/// assert_eq!(Email::parse("Ops@Example.COM").unwrap().as_str(), "ops@example.com");
/// assert!(Email::parse("ops@localhost").is_err());
/// assert!(Email::parse("@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Check the shape of `raw` and lowercase it.
    ///
    /// Accepts `user@host.tld` style addresses: non-empty user part, exactly
    /// one `@`, a domain of two or more non-empty dot-separated labels and no
    /// whitespace anywhere.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmailError`] the input trips over.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        match raw.len() {
            0 => return Err(EmailError::Empty),
            n if n > Self::MAX_LENGTH => {
                return Err(EmailError::TooLong {
                    max: Self::MAX_LENGTH,
                });
            }
            _ => {}
        }
        if raw.contains(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let Some((user, host)) = raw.split_once('@') else {
            return Err(EmailError::MissingAtSymbol);
        };
        if host.contains('@') {
            return Err(EmailError::MissingAtSymbol);
        }
        if user.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        let dotted = host.contains('.') && host.split('.').all(|label| !label.is_empty());
        if !dotted {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(raw.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pg_column!(Email => String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for ok in [
            "admin@sms.dev",
            "first.last@example.org",
            "ops+alerts@example.org",
            "x@mail.eu.example.org",
            "a@b.c",
        ] {
            assert!(Email::parse(ok).is_ok(), "{ok} should parse");
        }
    }

    #[test]
    fn test_lowercases_whole_address() {
        let email = Email::parse("Admin@SMS-Manager.IO").unwrap();
        assert_eq!(email.as_str(), "admin@sms-manager.io");
    }

    #[test]
    fn test_blank_and_oversized() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        let oversized = format!("{}@sms.dev", "u".repeat(Email::MAX_LENGTH));
        assert_eq!(
            Email::parse(&oversized),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_at_sign_count() {
        assert_eq!(Email::parse("admin.sms.dev"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("a@b@sms.dev"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("@sms.dev"), Err(EmailError::EmptyLocalPart));
    }

    #[test]
    fn test_domain_must_be_dotted() {
        for bad in ["admin@", "admin@localhost", "admin@sms.", "admin@.dev", "admin@sms..dev"] {
            assert_eq!(Email::parse(bad), Err(EmailError::InvalidDomain), "{bad}");
        }
    }

    #[test]
    fn test_whitespace_rejected() {
        assert_eq!(Email::parse("ad min@sms.dev"), Err(EmailError::Whitespace));
        assert_eq!(Email::parse(" admin@sms.dev"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let email: Email = serde_json::from_str("\"Ops@Example.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ops@example.com\"");
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }

    #[test]
    fn test_from_str() {
        let email: Email = "USER@example.com".parse().unwrap();
        assert_eq!(email.to_string(), "user@example.com");
    }
}

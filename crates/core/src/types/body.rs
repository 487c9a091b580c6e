//! SMS message body.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageBodyError {
    #[error("message cannot be empty")]
    Empty,
    #[error("message must be at most {max} characters")]
    TooLong { max: usize },
}

/// Text of an SMS message.
///
/// Lengths are counted in Unicode scalar values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    /// Six concatenated 153-character pages.
    pub const MAX_CHARS: usize = 918;

    /// Characters billed per page when computing delivery time.
    pub const PAGE_CHARS: usize = 160;

    /// # Errors
    ///
    /// Returns an error if the body is empty or longer than
    /// [`Self::MAX_CHARS`] characters.
    pub fn parse(s: &str) -> Result<Self, MessageBodyError> {
        let chars = s.chars().count();
        if chars == 0 {
            return Err(MessageBodyError::Empty);
        }
        if chars > Self::MAX_CHARS {
            return Err(MessageBodyError::TooLong {
                max: Self::MAX_CHARS,
            });
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Number of 160-character pages the text occupies.
    ///
    /// ```
    /// use sms_manager_core::MessageBody;
    ///
    /// assert_eq!(MessageBody::pages_for("hello"), 1);
    /// assert_eq!(MessageBody::pages_for(&"x".repeat(161)), 2);
    /// ```
    #[must_use]
    pub fn pages_for(text: &str) -> u32 {
        let pages = text.chars().count().div_ceil(Self::PAGE_CHARS);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn pages(&self) -> u32 {
        Self::pages_for(&self.0)
    }
}

impl TryFrom<String> for MessageBody {
    type Error = MessageBodyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        assert_eq!(MessageBody::parse(""), Err(MessageBodyError::Empty));
        assert!(MessageBody::parse("a").is_ok());
        assert!(MessageBody::parse(&"a".repeat(918)).is_ok());
        assert_eq!(
            MessageBody::parse(&"a".repeat(919)),
            Err(MessageBodyError::TooLong { max: 918 })
        );
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        assert!(MessageBody::parse(&"é".repeat(918)).is_ok());
    }

    #[test]
    fn test_pages() {
        assert_eq!(MessageBody::pages_for(""), 0);
        assert_eq!(MessageBody::pages_for(&"a".repeat(160)), 1);
        assert_eq!(MessageBody::pages_for(&"a".repeat(161)), 2);
        assert_eq!(MessageBody::pages_for(&"a".repeat(918)), 6);
        assert_eq!(MessageBody::pages_for(&"ü".repeat(160)), 1);
    }
}

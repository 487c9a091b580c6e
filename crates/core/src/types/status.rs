//! Message delivery status.

use serde::{Deserialize, Serialize};

/// Delivery state of a message.
///
/// Every message starts out `Pending` and moves exactly once to one of the
/// terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "message_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Pending,
    Delivered,
    Invalid,
    Undelivered,
}

impl MessageStatus {
    /// The statuses a pending message can settle into.
    pub const TERMINAL: [Self; 3] = [Self::Delivered, Self::Invalid, Self::Undelivered];

    /// Returns `true` once the message can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Invalid => "invalid",
            Self::Undelivered => "undelivered",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            "invalid" => Ok(Self::Invalid),
            "undelivered" => Ok(Self::Undelivered),
            _ => Err(format!("invalid message status: {s}")),
        }
    }
}

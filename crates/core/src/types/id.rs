//! Integer primary keys.
//!
//! Each table gets its own id type so a contact id can never be passed
//! where a message id is expected.

use super::column::pg_column;

macro_rules! serial_id {
    ($($name:ident),+ $(,)?) => {$(
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(raw: i32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i32 {
            fn from(wrapped: $name) -> Self {
                wrapped.0
            }
        }

        pg_column!($name => i32);
    )+};
}

serial_id!(UserId, ContactId, MessageId);

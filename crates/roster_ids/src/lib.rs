//! Typed row identifiers for Roster tables.
//!
//! Every table uses an auto-increment integer primary key. Wrapping each in
//! its own type keeps a `PriceId` from being passed where a `NoteId` is
//! expected, while the serialized form stays a plain integer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when parsing a row identifier fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    message: String,
}

impl IdParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdParseError {}

/// Untyped row id, as stored in a foreign-key column.
pub type RowId = i64;

macro_rules! define_row_id {
    ($name:ident, $table:literal, $label:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RowId);

        impl $name {
            /// Table this id belongs to.
            pub const TABLE: &'static str = $table;

            pub fn new(raw: RowId) -> Result<Self, IdParseError> {
                if raw <= 0 {
                    return Err(IdParseError::new(format!(
                        "Invalid {}: {} (must be positive)",
                        $label, raw
                    )));
                }
                Ok(Self(raw))
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                let raw = value
                    .trim()
                    .parse::<RowId>()
                    .map_err(|e| IdParseError::new(format!("Invalid {}: {}", $label, e)))?;
                Self::new(raw)
            }

            pub fn get(&self) -> RowId {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$name> for RowId {
            fn from(id: $name) -> RowId {
                id.0
            }
        }
    };
}

define_row_id!(NoteId, "note", "note ID");
define_row_id!(SettingId, "setting", "setting ID");
define_row_id!(PriceId, "price", "price ID");
define_row_id!(ServiceId, "service", "service ID");
define_row_id!(MemberId, "member", "member ID");

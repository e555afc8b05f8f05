//! Roster settings
//!
//! Typed key/value settings persisted as text. Every entry carries a
//! declared type (string, number, boolean, date); reads parse the stored text
//! under that type, writes are rejected if the entry is read-only or the
//! value has the wrong type.
//!
//! Some entries are pointers: their value is the key of another entry.
//! [`ConfigStore::resolve_indirect`] follows one hop, which is how the active
//! VAT rate is selected among several rate entries.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{seeds_from_schema, ConfigEntry, KeyPointer, SETTINGS_TABLE};
pub use error::{ConfigError, Result};
pub use store::{ConfigSnapshot, ConfigStore};

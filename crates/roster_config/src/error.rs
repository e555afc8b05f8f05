//! Error types for the settings store.

use roster_schema::{SettingType, ValueParseError};
use thiserror::Error;

/// Settings operation result type.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings errors.
///
/// Every variant is local to one operation: the store is left unchanged.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No entry with this key
    #[error("Setting not found: {key}")]
    NotFound { key: String },

    /// Stored or supplied text does not parse under the expected type
    #[error("Setting '{key}' has an unparsable value: {source}")]
    Parse {
        key: String,
        #[source]
        source: ValueParseError,
    },

    /// Write attempted on an entry with `editable = false`
    #[error("Setting '{key}' is read-only")]
    ReadOnlySetting { key: String },

    /// Typed write whose value has a different type than the entry
    #[error("Setting '{key}' has type {expected}, got a {got} value")]
    TypeMismatch {
        key: String,
        expected: SettingType,
        got: SettingType,
    },

    /// Two entries share a key
    #[error("Duplicate setting key: {0}")]
    DuplicateKey(String),

    /// A seed row could not be turned into an entry
    #[error("Invalid seed row {index}: {message}")]
    InvalidSeed { index: usize, message: String },

    /// Settings file could not be read or written
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a parse error.
    pub fn parse(key: impl Into<String>, source: ValueParseError) -> Self {
        Self::Parse {
            key: key.into(),
            source,
        }
    }

    /// Create a read-only error.
    pub fn read_only(key: impl Into<String>) -> Self {
        Self::ReadOnlySetting { key: key.into() }
    }
}

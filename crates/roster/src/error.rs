//! Record store errors.

use crate::integrity::IntegrityError;
use crate::value::ValueError;
use roster_ids::RowId;
use thiserror::Error;

/// Record operation result type.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors from [`crate::store::RecordStore`].
///
/// A failed operation never leaves a partial write behind.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Rows of this table belong to the settings store
    #[error("Table {0} is managed by the settings store")]
    SettingsTable(String),

    #[error("Unknown field: {table}.{field}")]
    UnknownField { table: String, field: String },

    /// Computed fields are derived on read and never stored
    #[error("{table}.{field} is computed and cannot be written")]
    ComputedField { table: String, field: String },

    #[error("{table}.{field} is assigned by the store")]
    PrimaryKeyAssigned { table: String, field: String },

    #[error("{table} {id} not found")]
    NotFound { table: String, id: RowId },

    #[error("{table}.{field} is required")]
    Required { table: String, field: String },

    #[error("{table}.{field}: {source}")]
    InvalidValue {
        table: String,
        field: String,
        #[source]
        source: ValueError,
    },

    #[error("{table}.{field} is longer than {max} characters ({len})")]
    TooLong {
        table: String,
        field: String,
        max: usize,
        len: usize,
    },

    #[error("{table}.{field}: '{value}' is not one of the allowed values")]
    NotAllowed {
        table: String,
        field: String,
        value: String,
    },

    #[error("{table}.{field}: {value} is below the minimum of {min}")]
    BelowMinimum {
        table: String,
        field: String,
        min: f64,
        value: f64,
    },

    #[error("{table}.{field}: {target} {id} does not exist")]
    DanglingReference {
        table: String,
        field: String,
        target: String,
        id: RowId,
    },

    #[error("{table}.{field}: value '{value}' already exists")]
    Duplicate {
        table: String,
        field: String,
        value: String,
    },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

impl RecordError {
    /// Create a not found error.
    pub fn not_found(table: impl Into<String>, id: RowId) -> Self {
        Self::NotFound {
            table: table.into(),
            id,
        }
    }

    /// Create an invalid value error.
    pub fn invalid(table: &str, field: &str, source: ValueError) -> Self {
        Self::InvalidValue {
            table: table.to_string(),
            field: field.to_string(),
            source,
        }
    }

    /// Create a required field error.
    pub fn required(table: &str, field: &str) -> Self {
        Self::Required {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    /// Whether the error is a refused delete.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Integrity(IntegrityError::Restricted { .. }))
    }
}

/// Errors from the [`crate::runtime::Roster`] facade.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error(transparent)]
    Schema(#[from] roster_schema::SchemaError),

    #[error(transparent)]
    Config(#[from] roster_config::ConfigError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Computed(#[from] crate::computed::ComputedFieldError),

    #[error(transparent)]
    Contract(#[from] crate::contract::ContractError),
}

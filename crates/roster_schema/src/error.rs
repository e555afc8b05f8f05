//! Error types for schema loading.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while loading a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] SchemaValidationError),
}

/// Every violation found while validating a schema document.
///
/// Validation is exhaustive: this error is only raised after the whole
/// document has been checked.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub struct SchemaValidationError {
    pub violations: Vec<SchemaViolation>,
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema validation failed with {} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

/// A single problem in the schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Where the problem is (e.g. `member.service_id`, `relation[2]`)
    pub location: String,

    /// Human-readable description
    pub message: String,

    /// Type of violation
    pub violation_type: ViolationType,
}

impl SchemaViolation {
    pub fn new(
        violation_type: ViolationType,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            violation_type,
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}': {}", self.violation_type, self.location, self.message)
    }
}

/// Types of schema violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Two tables share a name
    DuplicateTable,

    /// Two fields in one table share a name
    DuplicateField,

    /// Table declares zero or several primary keys
    PrimaryKeyCount,

    /// Foreign key points at a missing table or field
    DanglingForeignKey,

    /// SET NULL declared on a field that cannot be null
    SetNullOnRequired,

    /// Enum declared with no values
    EmptyEnum,

    /// Relation endpoint does not resolve to a field
    UnresolvedRelation,

    /// Relation disagrees with the foreign key of its `from` field
    RelationMismatch,

    /// Index refers to a missing table or field, or its name is reused
    InvalidIndex,

    /// Computed field is malformed or shadows a stored field
    InvalidComputedField,

    /// Seed row does not fit its table
    InvalidSeedRow,
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationType::DuplicateTable => write!(f, "Duplicate table"),
            ViolationType::DuplicateField => write!(f, "Duplicate field"),
            ViolationType::PrimaryKeyCount => write!(f, "Primary key count"),
            ViolationType::DanglingForeignKey => write!(f, "Dangling foreign key"),
            ViolationType::SetNullOnRequired => write!(f, "SET NULL on required field"),
            ViolationType::EmptyEnum => write!(f, "Empty enum"),
            ViolationType::UnresolvedRelation => write!(f, "Unresolved relation"),
            ViolationType::RelationMismatch => write!(f, "Relation mismatch"),
            ViolationType::InvalidIndex => write!(f, "Invalid index"),
            ViolationType::InvalidComputedField => write!(f, "Invalid computed field"),
            ViolationType::InvalidSeedRow => write!(f, "Invalid seed row"),
        }
    }
}

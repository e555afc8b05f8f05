//! Schema Registry
//!
//! One declarative document describes every table, field, relation and
//! computed field of the roster. It is loaded once at startup and never
//! mutated afterwards.
//!
//! A document that fails validation is FATAL: no other component may be
//! initialized from it, and every violation is reported at once so the author
//! can fix the document in one go.
//!
//! # Modules
//!
//! - [`document`]: Raw serde types mirroring the JSON document
//! - [`validation`]: Exhaustive static checks
//! - [`registry`]: The validated [`Schema`] and its metadata lookups
//! - [`domain`]: Closed enumerated domains (term, salutation, ...)
//! - [`setting`]: Typed setting values and their text form
//! - [`ddl`]: SQLite DDL rendering

pub mod ddl;
pub mod document;
pub mod domain;
pub mod error;
pub mod registry;
pub mod setting;
pub mod validation;

pub use document::{
    ComputedFieldDef, ComputedKind, FieldDef, FieldDefault, FieldRef, FieldType, ForeignKey,
    IndexDef, OnDelete, RelationDef, RelationKind, SchemaDocument, TableDef,
};
pub use domain::{DomainParseError, Gender, Salutation, SettingCategory, SettingType, Term};
pub use error::{SchemaError, SchemaValidationError, SchemaViolation, ViolationType};
pub use registry::{IncomingReference, Schema};
pub use setting::{TypedValue, ValueParseError, DATE_FORMAT};

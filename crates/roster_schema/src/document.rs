//! Raw schema document types.
//!
//! These mirror the JSON document one-to-one and carry no guarantees. A
//! [`crate::Schema`] is only obtained by validating a [`SchemaDocument`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub meta: DocumentMeta,

    pub database: DatabaseSection,

    /// Presentation metadata. Carried through untouched for editor collaborators.
    #[serde(default)]
    pub ui: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

/// A table declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub computed_fields: Vec<ComputedFieldDef>,
    /// Rows inserted once when the backing store is empty.
    #[serde(default)]
    pub seed_data: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl TableDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field, if exactly one is declared.
    pub fn primary_key(&self) -> Option<&FieldDef> {
        let mut keys = self.fields.iter().filter(|f| f.primary_key);
        match (keys.next(), keys.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    }

    pub fn computed_field(&self, name: &str) -> Option<&ComputedFieldDef> {
        self.computed_fields.iter().find(|c| c.name == name)
    }
}

/// A stored field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default, rename = "enum")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub foreign_key: Option<ForeignKey>,
    #[serde(default)]
    pub default: Option<FieldDefault>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            auto_increment: false,
            nullable: true,
            unique: false,
            max_length: None,
            min: None,
            allowed_values: None,
            foreign_key: None,
            default: None,
            comment: None,
        }
    }

    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = true;
        self.nullable = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn references(mut self, table: &str, field: &str, on_delete: OnDelete) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.to_string(),
            field: field.to_string(),
            on_delete,
        });
        self
    }

    pub fn is_enum(&self) -> bool {
        self.allowed_values.is_some()
    }
}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Boolean,
    Date,
    Datetime,
}

impl FieldType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            FieldType::Integer | FieldType::Boolean => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Text | FieldType::Date | FieldType::Datetime => "TEXT",
        }
    }

    /// Name as written in the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Text => "TEXT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::Datetime => "DATETIME",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Foreign key declaration on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub table: String,
    pub field: String,
    #[serde(default)]
    pub on_delete: OnDelete,
}

/// Deletion policy applied to rows referencing a deleted row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnDelete {
    /// Clear the referencing foreign key, then delete.
    #[serde(rename = "SET NULL")]
    SetNull,
    /// Refuse the delete while any reference exists.
    #[default]
    #[serde(rename = "RESTRICT")]
    Restrict,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

/// Value applied when a row is created without the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Flag(bool),
    Number(f64),
    /// Either a keyword (`CURRENT_TIMESTAMP`, `CURRENT_DATE`) or a literal string.
    Text(String),
}

impl FieldDefault {
    pub const CURRENT_TIMESTAMP: &'static str = "CURRENT_TIMESTAMP";
    pub const CURRENT_DATE: &'static str = "CURRENT_DATE";

    pub fn is_current_timestamp(&self) -> bool {
        matches!(self, FieldDefault::Text(t) if t == Self::CURRENT_TIMESTAMP)
    }

    pub fn is_current_date(&self) -> bool {
        matches!(self, FieldDefault::Text(t) if t == Self::CURRENT_DATE)
    }
}

/// A derived, never-stored field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedFieldDef {
    pub name: String,
    pub kind: ComputedKind,
    /// Stored field the formula reads.
    pub source: String,
    /// Pointer setting naming the active rate (net amounts only).
    #[serde(default)]
    pub rate_pointer: Option<String>,
    /// Human-readable formula, informational only.
    #[serde(default)]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputedKind {
    /// `source / (1 + rate / 100)`
    NetFromGross,
    /// `floor(days_between(source, reference) / 365.25)`
    AgeInYears,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDef {
    pub table: String,
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// A relation between two fields, written as `table.field`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDef {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    ManyToOne,
    OneToOne,
}

/// A `table.field` reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub table: String,
    pub field: String,
}

impl FieldRef {
    pub fn parse(raw: &str) -> Option<Self> {
        let (table, field) = raw.split_once('.')?;
        if table.is_empty() || field.is_empty() || field.contains('.') {
            return None;
        }
        Some(Self {
            table: table.to_string(),
            field: field.to_string(),
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.field)
    }
}

/// Serialized in its `table.field` form.
impl Serialize for FieldRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_defaults_deserialize() {
        let field: FieldDef = serde_json::from_str(
            r#"{ "name": "created_at", "type": "DATETIME", "nullable": false, "default": "CURRENT_TIMESTAMP" }"#,
        )
        .unwrap();
        assert_eq!(field.field_type, FieldType::Datetime);
        assert!(!field.nullable);
        assert!(field.default.unwrap().is_current_timestamp());

        let flag: FieldDef =
            serde_json::from_str(r#"{ "name": "editable", "type": "BOOLEAN", "default": true }"#).unwrap();
        assert!(flag.nullable, "nullable defaults to true");
        assert_eq!(flag.default, Some(FieldDefault::Flag(true)));
    }

    #[test]
    fn test_foreign_key_policy_names() {
        let fk: ForeignKey =
            serde_json::from_str(r#"{ "table": "note", "field": "id", "onDelete": "SET NULL" }"#).unwrap();
        assert_eq!(fk.on_delete, OnDelete::SetNull);

        let fk: ForeignKey = serde_json::from_str(r#"{ "table": "price", "field": "id" }"#).unwrap();
        assert_eq!(fk.on_delete, OnDelete::Restrict);
    }

    #[test]
    fn test_field_ref_parse() {
        let r = FieldRef::parse("member.service_id").unwrap();
        assert_eq!(r.table, "member");
        assert_eq!(r.field, "service_id");
        assert_eq!(r.to_string(), "member.service_id");

        assert!(FieldRef::parse("member").is_none());
        assert!(FieldRef::parse(".id").is_none());
        assert!(FieldRef::parse("a.b.c").is_none());
    }
}

//! Validated schema and the metadata lookups the runtime relies on.

use crate::document::{
    ComputedFieldDef, FieldDef, FieldRef, IndexDef, OnDelete, RelationDef, SchemaDocument,
    TableDef,
};
use crate::error::{SchemaError, SchemaValidationError};
use crate::validation;
use std::path::Path;
use tracing::{debug, info, warn};

/// The document shipped with the crate.
pub const BUILTIN_DOCUMENT: &str = include_str!("../schema/roster.json");

/// A validated schema document.
///
/// The only constructors go through [`validation::validate`], so holding a
/// `Schema` means every foreign key, relation and seed row resolved.
#[derive(Debug, Clone)]
pub struct Schema {
    document: SchemaDocument,
}

/// A foreign-key edge pointing at some table, seen from the referencing side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingReference {
    /// Referencing table and field (e.g. `member.note_id`)
    pub from: FieldRef,
    /// Referenced field (e.g. `note.id`)
    pub to: FieldRef,
    pub on_delete: OnDelete,
}

impl Schema {
    /// Validate a parsed document.
    pub fn load(document: SchemaDocument) -> Result<Self, SchemaValidationError> {
        let violations = validation::validate(&document);
        if !violations.is_empty() {
            for violation in &violations {
                warn!(%violation, "Schema violation");
            }
            return Err(SchemaValidationError { violations });
        }

        info!(
            tables = document.database.tables.len(),
            relations = document.database.relations.len(),
            version = document.meta.version.as_deref().unwrap_or("unversioned"),
            "Schema loaded"
        );
        Ok(Self { document })
    }

    /// Parse and validate a JSON document.
    pub fn load_str(json: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Ok(Self::load(document)?)
    }

    /// Read, parse and validate a JSON document from disk.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading schema document");
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_str(&json)
    }

    /// The document embedded in the crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::load_str(BUILTIN_DOCUMENT)
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.document.database.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables().iter().find(|t| t.name == name)
    }

    pub fn field(&self, table: &str, field: &str) -> Option<&FieldDef> {
        self.table(table)?.field(field)
    }

    /// Primary key field name of a table.
    pub fn primary_key(&self, table: &str) -> Option<&str> {
        self.table(table)?.primary_key().map(|f| f.name.as_str())
    }

    pub fn relations(&self) -> &[RelationDef] {
        &self.document.database.relations
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.document.database.indexes
    }

    pub fn computed_fields(&self, table: &str) -> &[ComputedFieldDef] {
        self.table(table)
            .map(|t| t.computed_fields.as_slice())
            .unwrap_or(&[])
    }

    /// Every foreign key that targets `table`, across all tables.
    ///
    /// Declared relations are checked against foreign keys at load time, so
    /// this is the same edge set the `relations` section names.
    pub fn references_to(&self, table: &str) -> Vec<IncomingReference> {
        let mut refs = Vec::new();
        for source in self.tables() {
            for field in &source.fields {
                let Some(fk) = &field.foreign_key else {
                    continue;
                };
                if fk.table == table {
                    refs.push(IncomingReference {
                        from: FieldRef {
                            table: source.name.clone(),
                            field: field.name.clone(),
                        },
                        to: FieldRef {
                            table: fk.table.clone(),
                            field: fk.field.clone(),
                        },
                        on_delete: fk.on_delete,
                    });
                }
            }
        }
        refs
    }

    /// Seed rows declared for `table`.
    pub fn seed_rows(&self, table: &str) -> &[serde_json::Map<String, serde_json::Value>] {
        self.table(table)
            .map(|t| t.seed_data.as_slice())
            .unwrap_or(&[])
    }

    /// Presentation metadata, untouched.
    pub fn ui(&self) -> &serde_json::Value {
        &self.document.ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationType;

    #[test]
    fn test_builtin_document_loads() {
        let schema = Schema::builtin().unwrap();
        for table in ["note", "setting", "price", "service", "member"] {
            assert!(schema.table(table).is_some(), "missing table {}", table);
            assert_eq!(schema.primary_key(table), Some("id"));
        }
        assert_eq!(schema.relations().len(), 5);
        assert_eq!(schema.seed_rows("setting").len(), 10);
        assert_eq!(schema.computed_fields("price")[0].name, "net_amount");
        assert_eq!(schema.computed_fields("member")[0].name, "age");
        assert!(schema.ui().get("screens").is_some());
    }

    #[test]
    fn test_references_to_note_are_all_set_null() {
        let schema = Schema::builtin().unwrap();
        let refs = schema.references_to("note");
        let mut from: Vec<String> = refs.iter().map(|r| r.from.to_string()).collect();
        from.sort();
        assert_eq!(from, vec!["member.note_id", "price.note_id", "service.note_id"]);
        assert!(refs.iter().all(|r| r.on_delete == OnDelete::SetNull));
    }

    #[test]
    fn test_references_to_price_restrict() {
        let schema = Schema::builtin().unwrap();
        let refs = schema.references_to("price");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].from.to_string(), "service.price_id");
        assert_eq!(refs[0].on_delete, OnDelete::Restrict);
    }

    #[test]
    fn test_invalid_document_is_rejected_with_all_violations() {
        let err = Schema::load_str(
            r#"{ "database": { "tables": [
                { "name": "a", "fields": [ { "name": "x", "type": "TEXT", "enum": [] } ] }
            ]}}"#,
        )
        .unwrap_err();

        match err {
            SchemaError::Validation(e) => {
                let kinds: Vec<_> = e.violations.iter().map(|v| v.violation_type).collect();
                assert_eq!(kinds, vec![ViolationType::PrimaryKeyCount, ViolationType::EmptyEnum]);
                assert!(e.to_string().contains("2 violation(s)"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(Schema::load_str("{ not json"), Err(SchemaError::Parse(_))));
    }

    #[test]
    fn test_load_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, BUILTIN_DOCUMENT).unwrap();
        let schema = Schema::load_path(&path).unwrap();
        assert!(schema.table("member").is_some());

        let missing = Schema::load_path(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(SchemaError::Io { .. })));
    }
}

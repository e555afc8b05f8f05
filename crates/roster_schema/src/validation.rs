//! Static validation of a schema document.
//!
//! Every check runs to completion and pushes its findings into one list, so a
//! broken document reports all of its problems at once.

use crate::document::{
    ComputedKind, FieldDef, FieldRef, FieldType, OnDelete, SchemaDocument, TableDef,
};
use crate::domain::SettingType;
use crate::error::{SchemaViolation, ViolationType};
use crate::setting::TypedValue;
use std::collections::{HashMap, HashSet};

/// Seed rows that carry a `type` naming a [`SettingType`] must have a `value`
/// that parses under it.
const TYPED_SEED_TYPE_FIELD: &str = "type";
const TYPED_SEED_VALUE_FIELD: &str = "value";

/// Validate a document, returning every violation found.
pub fn validate(doc: &SchemaDocument) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    let tables = index_tables(doc, &mut violations);

    for table in &doc.database.tables {
        check_fields(table, &tables, &mut violations);
        check_computed_fields(table, &mut violations);
        check_seed_rows(table, &mut violations);
    }
    check_relations(doc, &tables, &mut violations);
    check_indexes(doc, &tables, &mut violations);

    violations
}

fn index_tables<'a>(
    doc: &'a SchemaDocument,
    violations: &mut Vec<SchemaViolation>,
) -> HashMap<&'a str, &'a TableDef> {
    let mut tables = HashMap::new();
    for table in &doc.database.tables {
        if tables.insert(table.name.as_str(), table).is_some() {
            violations.push(SchemaViolation::new(
                ViolationType::DuplicateTable,
                &table.name,
                "table declared more than once",
            ));
        }
    }
    tables
}

fn check_fields(
    table: &TableDef,
    tables: &HashMap<&str, &TableDef>,
    violations: &mut Vec<SchemaViolation>,
) {
    let pk_count = table.fields.iter().filter(|f| f.primary_key).count();
    if pk_count != 1 {
        violations.push(SchemaViolation::new(
            ViolationType::PrimaryKeyCount,
            &table.name,
            format!("expected exactly one primary key, found {}", pk_count),
        ));
    }

    let mut seen = HashSet::new();
    for field in &table.fields {
        let location = format!("{}.{}", table.name, field.name);
        if !seen.insert(field.name.as_str()) {
            violations.push(SchemaViolation::new(
                ViolationType::DuplicateField,
                &location,
                "field declared more than once",
            ));
        }

        if let Some(values) = &field.allowed_values {
            if values.is_empty() {
                violations.push(SchemaViolation::new(
                    ViolationType::EmptyEnum,
                    &location,
                    "enum must declare at least one value",
                ));
            }
        }

        if let Some(fk) = &field.foreign_key {
            match tables.get(fk.table.as_str()) {
                None => violations.push(SchemaViolation::new(
                    ViolationType::DanglingForeignKey,
                    &location,
                    format!("target table '{}' does not exist", fk.table),
                )),
                Some(target) if target.field(&fk.field).is_none() => {
                    violations.push(SchemaViolation::new(
                        ViolationType::DanglingForeignKey,
                        &location,
                        format!("target field '{}.{}' does not exist", fk.table, fk.field),
                    ))
                }
                Some(_) => {}
            }

            if fk.on_delete == OnDelete::SetNull && !field.nullable {
                violations.push(SchemaViolation::new(
                    ViolationType::SetNullOnRequired,
                    &location,
                    "ON DELETE SET NULL requires a nullable field",
                ));
            }
        }
    }
}

fn check_computed_fields(table: &TableDef, violations: &mut Vec<SchemaViolation>) {
    let mut seen = HashSet::new();
    for computed in &table.computed_fields {
        let location = format!("{}.{}", table.name, computed.name);

        if table.field(&computed.name).is_some() || !seen.insert(computed.name.as_str()) {
            violations.push(SchemaViolation::new(
                ViolationType::InvalidComputedField,
                &location,
                "name collides with another field",
            ));
        }

        let expected = match computed.kind {
            ComputedKind::NetFromGross => &[FieldType::Real, FieldType::Integer][..],
            ComputedKind::AgeInYears => &[FieldType::Date][..],
        };
        match table.field(&computed.source) {
            None => violations.push(SchemaViolation::new(
                ViolationType::InvalidComputedField,
                &location,
                format!("source field '{}' does not exist", computed.source),
            )),
            Some(source) if !expected.contains(&source.field_type) => {
                violations.push(SchemaViolation::new(
                    ViolationType::InvalidComputedField,
                    &location,
                    format!(
                        "source field '{}' has type {}, which {:?} cannot read",
                        computed.source, source.field_type, computed.kind
                    ),
                ))
            }
            Some(_) => {}
        }

        if computed.kind == ComputedKind::NetFromGross && computed.rate_pointer.is_none() {
            violations.push(SchemaViolation::new(
                ViolationType::InvalidComputedField,
                &location,
                "net amounts need a ratePointer setting",
            ));
        }
    }
}

fn check_seed_rows(table: &TableDef, violations: &mut Vec<SchemaViolation>) {
    let mut unique_values: HashMap<&str, HashSet<String>> = HashMap::new();

    for (index, row) in table.seed_data.iter().enumerate() {
        let location = format!("{}.seedData[{}]", table.name, index);

        for (name, value) in row {
            let Some(field) = table.field(name) else {
                violations.push(SchemaViolation::new(
                    ViolationType::InvalidSeedRow,
                    &location,
                    format!("unknown field '{}'", name),
                ));
                continue;
            };
            if let Err(message) = check_seed_value(field, value) {
                violations.push(SchemaViolation::new(
                    ViolationType::InvalidSeedRow,
                    &location,
                    format!("field '{}': {}", name, message),
                ));
            }
            if field.unique && !value.is_null() {
                let seen = unique_values.entry(field.name.as_str()).or_default();
                if !seen.insert(value.to_string()) {
                    violations.push(SchemaViolation::new(
                        ViolationType::InvalidSeedRow,
                        &location,
                        format!("duplicate value {} for unique field '{}'", value, name),
                    ));
                }
            }
        }

        for field in &table.fields {
            let omittable = field.nullable || field.auto_increment || field.default.is_some();
            if !omittable && !row.contains_key(&field.name) {
                violations.push(SchemaViolation::new(
                    ViolationType::InvalidSeedRow,
                    &location,
                    format!("missing required field '{}'", field.name),
                ));
            }
        }

        let declared_type = row
            .get(TYPED_SEED_TYPE_FIELD)
            .and_then(|v| v.as_str())
            .and_then(|t| SettingType::parse(t).ok());
        let text = row.get(TYPED_SEED_VALUE_FIELD).and_then(|v| v.as_str());
        if let (Some(setting_type), Some(text)) = (declared_type, text) {
            if let Err(err) = TypedValue::parse(setting_type, text) {
                violations.push(SchemaViolation::new(
                    ViolationType::InvalidSeedRow,
                    &location,
                    err.to_string(),
                ));
            }
        }
    }
}

fn check_seed_value(field: &FieldDef, value: &serde_json::Value) -> Result<(), String> {
    use serde_json::Value;

    if value.is_null() {
        return if field.nullable {
            Ok(())
        } else {
            Err("null in non-nullable field".to_string())
        };
    }

    let kind_ok = match field.field_type {
        FieldType::Integer => value.is_i64(),
        FieldType::Real => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Text | FieldType::Date | FieldType::Datetime => value.is_string(),
    };
    if !kind_ok {
        return Err(format!("{} is not a {} value", value, field.field_type));
    }

    if let (Some(allowed), Value::String(s)) = (&field.allowed_values, value) {
        if !allowed.contains(s) {
            return Err(format!("'{}' is not one of {:?}", s, allowed));
        }
    }
    if let (Some(max), Value::String(s)) = (field.max_length, value) {
        if s.chars().count() > max {
            return Err(format!("longer than {} characters", max));
        }
    }
    if let (Some(min), Some(n)) = (field.min, value.as_f64()) {
        if n < min {
            return Err(format!("{} is below the minimum {}", n, min));
        }
    }
    Ok(())
}

fn check_relations(
    doc: &SchemaDocument,
    tables: &HashMap<&str, &TableDef>,
    violations: &mut Vec<SchemaViolation>,
) {
    for (index, relation) in doc.database.relations.iter().enumerate() {
        let location = format!("relation[{}] {} -> {}", index, relation.from, relation.to);

        let from = resolve_field_ref(&relation.from, tables);
        let to = resolve_field_ref(&relation.to, tables);
        if let Err(message) = &from {
            violations.push(SchemaViolation::new(
                ViolationType::UnresolvedRelation,
                &location,
                format!("from: {}", message),
            ));
        }
        if let Err(message) = &to {
            violations.push(SchemaViolation::new(
                ViolationType::UnresolvedRelation,
                &location,
                format!("to: {}", message),
            ));
        }

        if let (Ok((_, from_field)), Ok((to_ref, _))) = (&from, &to) {
            let agrees = from_field
                .foreign_key
                .as_ref()
                .map(|fk| fk.table == to_ref.table && fk.field == to_ref.field)
                .unwrap_or(false);
            if !agrees {
                violations.push(SchemaViolation::new(
                    ViolationType::RelationMismatch,
                    &location,
                    format!("'{}' has no foreign key to '{}'", relation.from, relation.to),
                ));
            }
        }
    }
}

fn resolve_field_ref<'a>(
    raw: &str,
    tables: &HashMap<&str, &'a TableDef>,
) -> Result<(FieldRef, &'a FieldDef), String> {
    let field_ref =
        FieldRef::parse(raw).ok_or_else(|| format!("'{}' is not of the form table.field", raw))?;
    let table = tables
        .get(field_ref.table.as_str())
        .ok_or_else(|| format!("table '{}' does not exist", field_ref.table))?;
    let field = table
        .field(&field_ref.field)
        .ok_or_else(|| format!("field '{}' does not exist", field_ref))?;
    Ok((field_ref, field))
}

fn check_indexes(
    doc: &SchemaDocument,
    tables: &HashMap<&str, &TableDef>,
    violations: &mut Vec<SchemaViolation>,
) {
    let mut names = HashSet::new();
    for index in &doc.database.indexes {
        if !names.insert(index.name.as_str()) {
            violations.push(SchemaViolation::new(
                ViolationType::InvalidIndex,
                &index.name,
                "index name declared more than once",
            ));
        }
        if index.fields.is_empty() {
            violations.push(SchemaViolation::new(
                ViolationType::InvalidIndex,
                &index.name,
                "index has no fields",
            ));
        }
        let Some(table) = tables.get(index.table.as_str()) else {
            violations.push(SchemaViolation::new(
                ViolationType::InvalidIndex,
                &index.name,
                format!("table '{}' does not exist", index.table),
            ));
            continue;
        };
        for field in &index.fields {
            if table.field(field).is_none() {
                violations.push(SchemaViolation::new(
                    ViolationType::InvalidIndex,
                    &index.name,
                    format!("field '{}.{}' does not exist", index.table, field),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> SchemaDocument {
        serde_json::from_str(json).unwrap()
    }

    fn kinds(violations: &[SchemaViolation]) -> Vec<ViolationType> {
        violations.iter().map(|v| v.violation_type).collect()
    }

    #[test]
    fn test_minimal_document_is_valid() {
        let d = doc(r#"{
            "database": {
                "tables": [
                    { "name": "note", "fields": [
                        { "name": "id", "type": "INTEGER", "primaryKey": true, "nullable": false },
                        { "name": "title", "type": "TEXT", "nullable": false }
                    ]}
                ]
            }
        }"#);
        assert!(validate(&d).is_empty());
    }

    #[test]
    fn test_collects_every_violation_in_one_pass() {
        let d = doc(r#"{
            "database": {
                "tables": [
                    { "name": "a", "fields": [
                        { "name": "x", "type": "TEXT", "enum": [] },
                        { "name": "b_id", "type": "INTEGER", "nullable": false,
                          "foreignKey": { "table": "b", "field": "id", "onDelete": "SET NULL" } }
                    ]},
                    { "name": "c", "fields": [
                        { "name": "id", "type": "INTEGER", "primaryKey": true },
                        { "name": "id2", "type": "INTEGER", "primaryKey": true },
                        { "name": "a_ref", "type": "INTEGER", "foreignKey": { "table": "a", "field": "missing" } }
                    ]}
                ],
                "relations": [
                    { "from": "c.nope", "to": "a.x", "type": "many-to-one" }
                ]
            }
        }"#);

        let violations = validate(&d);
        let kinds = kinds(&violations);
        assert_eq!(kinds.iter().filter(|k| **k == ViolationType::PrimaryKeyCount).count(), 2);
        assert!(kinds.contains(&ViolationType::EmptyEnum));
        assert_eq!(kinds.iter().filter(|k| **k == ViolationType::DanglingForeignKey).count(), 2);
        assert!(kinds.contains(&ViolationType::SetNullOnRequired));
        assert!(kinds.contains(&ViolationType::UnresolvedRelation));
    }

    #[test]
    fn test_relation_must_match_foreign_key() {
        let d = doc(r#"{
            "database": {
                "tables": [
                    { "name": "note", "fields": [ { "name": "id", "type": "INTEGER", "primaryKey": true } ] },
                    { "name": "price", "fields": [
                        { "name": "id", "type": "INTEGER", "primaryKey": true },
                        { "name": "note_id", "type": "INTEGER" }
                    ]}
                ],
                "relations": [ { "from": "price.note_id", "to": "note.id", "type": "many-to-one" } ]
            }
        }"#);
        assert_eq!(kinds(&validate(&d)), vec![ViolationType::RelationMismatch]);
    }

    #[test]
    fn test_seed_values_must_parse_as_declared_type() {
        let d = doc(r#"{
            "database": {
                "tables": [
                    { "name": "setting", "fields": [
                        { "name": "id", "type": "INTEGER", "primaryKey": true, "autoIncrement": true, "nullable": false },
                        { "name": "key", "type": "TEXT", "nullable": false, "unique": true },
                        { "name": "value", "type": "TEXT" },
                        { "name": "type", "type": "TEXT", "nullable": false, "enum": ["string", "number", "boolean", "date"] }
                    ],
                    "seedData": [
                        { "key": "rate", "value": "nineteen", "type": "number" },
                        { "key": "rate", "value": "19", "type": "number" },
                        { "key": "flag", "value": "1", "type": "bool" },
                        { "value": "x", "type": "string" }
                    ]}
                ]
            }
        }"#);

        let violations = validate(&d);
        assert_eq!(violations.len(), 4, "{:#?}", violations);
        assert!(violations.iter().all(|v| v.violation_type == ViolationType::InvalidSeedRow));
        assert!(violations[0].message.contains("nineteen"));
        assert!(violations.iter().any(|v| v.message.contains("duplicate value")));
        assert!(violations.iter().any(|v| v.message.contains("'bool'")));
        assert!(violations.iter().any(|v| v.message.contains("missing required field 'key'")));
    }

    #[test]
    fn test_computed_field_checks() {
        let d = doc(r#"{
            "database": {
                "tables": [
                    { "name": "price", "fields": [
                        { "name": "id", "type": "INTEGER", "primaryKey": true },
                        { "name": "gross_amount", "type": "REAL", "nullable": false },
                        { "name": "label", "type": "TEXT" }
                    ],
                    "computedFields": [
                        { "name": "net_amount", "kind": "net_from_gross", "source": "gross_amount" },
                        { "name": "label", "kind": "age_in_years", "source": "gross_amount" }
                    ]}
                ]
            }
        }"#);

        let violations = validate(&d);
        assert_eq!(violations.len(), 3, "{:#?}", violations);
        assert!(violations.iter().all(|v| v.violation_type == ViolationType::InvalidComputedField));
    }

    #[test]
    fn test_index_checks() {
        let d = doc(r#"{
            "database": {
                "tables": [
                    { "name": "note", "fields": [ { "name": "id", "type": "INTEGER", "primaryKey": true } ] }
                ],
                "indexes": [
                    { "table": "note", "name": "idx_a", "fields": ["id"] },
                    { "table": "note", "name": "idx_a", "fields": ["missing"] },
                    { "table": "ghost", "name": "idx_b", "fields": ["id"] }
                ]
            }
        }"#);
        let violations = validate(&d);
        assert_eq!(violations.len(), 3, "{:#?}", violations);
        assert!(violations.iter().all(|v| v.violation_type == ViolationType::InvalidIndex));
    }
}

//! SQLite DDL rendering for a validated schema.
//!
//! All CREATE TABLE / CREATE INDEX statements are derived from the document,
//! so the persistence layer and the runtime share one source of truth.

use crate::document::{FieldDef, FieldDefault, FieldType, TableDef};
use crate::registry::Schema;

/// Render the full schema as SQLite statements, tables first, then indexes.
///
/// Tables are emitted in document order; SQLite resolves foreign keys lazily,
/// so forward references are allowed.
pub fn render_sqlite(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str("PRAGMA foreign_keys = ON;\n");

    for table in schema.tables() {
        out.push('\n');
        out.push_str(&create_table(table));
    }

    if !schema.indexes().is_empty() {
        out.push('\n');
    }
    for index in schema.indexes() {
        out.push_str(&format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}({});\n",
            if index.unique { "UNIQUE " } else { "" },
            index.name,
            index.table,
            index.fields.join(", ")
        ));
    }

    out
}

fn create_table(table: &TableDef) -> String {
    let mut lines: Vec<String> = table.fields.iter().map(column_definition).collect();

    for field in &table.fields {
        if let Some(fk) = &field.foreign_key {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {}",
                field.name,
                fk.table,
                fk.field,
                fk.on_delete.as_sql()
            ));
        }
    }

    let body = lines
        .iter()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n", table.name, body)
}

fn column_definition(field: &FieldDef) -> String {
    let mut def = format!("{} {}", field.name, field.field_type.as_sql());

    if field.primary_key {
        def.push_str(" PRIMARY KEY");
        if field.auto_increment {
            def.push_str(" AUTOINCREMENT");
        }
        return def;
    }
    if !field.nullable {
        def.push_str(" NOT NULL");
    }
    if field.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &field.default {
        def.push_str(&format!(" DEFAULT {}", default_literal(default, field.field_type)));
    }

    let mut checks = Vec::new();
    if let Some(values) = &field.allowed_values {
        let list = values
            .iter()
            .map(|v| quote(v))
            .collect::<Vec<_>>()
            .join(", ");
        checks.push(format!("{} IN ({})", field.name, list));
    }
    if let Some(max) = field.max_length {
        checks.push(format!("length({}) <= {}", field.name, max));
    }
    if let Some(min) = field.min {
        checks.push(format!("{} >= {}", field.name, min));
    }
    if field.field_type == FieldType::Boolean {
        checks.push(format!("{} IN (0, 1)", field.name));
    }
    if !checks.is_empty() {
        def.push_str(&format!(" CHECK ({})", checks.join(" AND ")));
    }

    def
}

fn default_literal(default: &FieldDefault, field_type: FieldType) -> String {
    match default {
        FieldDefault::Flag(b) => (if *b { "1" } else { "0" }).to_string(),
        FieldDefault::Number(n) => n.to_string(),
        FieldDefault::Text(_) if default.is_current_timestamp() => "CURRENT_TIMESTAMP".to_string(),
        FieldDefault::Text(_) if default.is_current_date() => "CURRENT_DATE".to_string(),
        FieldDefault::Text(t) if field_type == FieldType::Text => quote(t),
        FieldDefault::Text(t) => format!("({})", quote(t)),
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_builtin_schema() {
        let schema = Schema::builtin().unwrap();
        let sql = render_sqlite(&schema);

        assert!(sql.starts_with("PRAGMA foreign_keys = ON;"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS member ("));
        assert!(sql.contains("    id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("key TEXT NOT NULL UNIQUE CHECK (length(key) <= 100)"));
        assert!(sql.contains("FOREIGN KEY (price_id) REFERENCES price(id) ON DELETE RESTRICT"));
        assert!(sql.contains("FOREIGN KEY (note_id) REFERENCES note(id) ON DELETE SET NULL"));
        assert!(sql.contains("term TEXT NOT NULL CHECK (term IN ('one-off', 'monthly', 'quarterly', 'yearly'))"));
        assert!(sql.contains("created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP"));
        assert!(sql.contains("editable INTEGER NOT NULL DEFAULT 1 CHECK (editable IN (0, 1))"));
        assert!(sql.contains("gross_amount REAL NOT NULL CHECK (gross_amount >= 0)"));
        assert!(sql.contains("CREATE UNIQUE INDEX IF NOT EXISTS idx_setting_key ON setting(key);"));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_member_name ON member(name, first_name);"));
    }

    #[test]
    fn test_computed_fields_are_not_columns() {
        let sql = render_sqlite(&Schema::builtin().unwrap());
        assert!(!sql.contains("net_amount"));
        assert!(!sql.contains(" age "));
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
    }
}

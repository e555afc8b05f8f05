//! Schema command - validate a document and render its DDL

use super::context::{load_schema, schema_source};
use super::error::HelpfulError;
use anyhow::{Context, Result};
use clap::Subcommand;
use roster_schema::{ddl, Schema, SchemaError};
use std::path::Path;

/// Subcommands for the schema document
#[derive(Subcommand, Debug, Clone)]
pub enum SchemaAction {
    /// Validate the document and list every violation
    Check {
        #[arg(long)]
        json: bool,
    },
    /// Print SQLite DDL for every table and index
    Ddl,
}

impl SchemaAction {
    pub fn wants_json(&self) -> bool {
        matches!(self, SchemaAction::Check { json: true })
    }
}

/// Execute the schema command
pub fn run(action: SchemaAction, schema_path: Option<&Path>) -> Result<()> {
    match action {
        SchemaAction::Check { json } => check(schema_path, json),
        SchemaAction::Ddl => {
            let schema = load_schema(schema_path)?;
            print!("{}", ddl::render_sqlite(&schema));
            Ok(())
        }
    }
}

fn check(schema_path: Option<&Path>, json: bool) -> Result<()> {
    let source = schema_source(schema_path);
    if let Some(p) = schema_path {
        if !p.exists() {
            return Err(HelpfulError::schema_not_found(p).into());
        }
    }
    let loaded = match schema_path {
        Some(p) => Schema::load_path(p),
        None => Schema::builtin(),
    };

    match loaded {
        Ok(schema) => {
            if json {
                let tables: Vec<&str> = schema.tables().iter().map(|t| t.name.as_str()).collect();
                let report = serde_json::json!({
                    "source": source,
                    "valid": true,
                    "tables": tables,
                    "relations": schema.relations().len(),
                    "indexes": schema.indexes().len(),
                    "violations": [],
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Schema {} is valid", source);
                println!(
                    "  {} table(s), {} relation(s), {} index(es)",
                    schema.tables().len(),
                    schema.relations().len(),
                    schema.indexes().len()
                );
            }
            Ok(())
        }
        Err(SchemaError::Validation(e)) => {
            if json {
                let report = serde_json::json!({
                    "source": source,
                    "valid": false,
                    "violations": e.violations,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Schema {} is INVALID", source);
                for violation in &e.violations {
                    println!("  - {}", violation);
                }
            }
            Err(HelpfulError::invalid_schema(&source, e.violations.len()).into())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load schema {}", source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_builtin_schema() {
        run(SchemaAction::Check { json: true }, None).unwrap();
    }

    #[test]
    fn test_check_invalid_file_fails_with_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{ "database": { "tables": [ { "name": "a", "fields": [] } ] } }"#,
        )
        .unwrap();

        let err = run(SchemaAction::Check { json: false }, Some(&path)).unwrap_err();
        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("1 violation(s)"));
    }

    #[test]
    fn test_missing_schema_file() {
        let err = run(SchemaAction::Ddl, Some(Path::new("/nonexistent/schema.json"))).unwrap_err();
        assert!(err.downcast_ref::<HelpfulError>().is_some());
    }
}

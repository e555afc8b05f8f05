//! Shared setup for commands: schema source and settings file.

use super::error::HelpfulError;
use anyhow::{Context, Result};
use roster_config::{seeds_from_schema, ConfigStore};
use roster_schema::{Schema, SchemaError};
use std::path::Path;
use tracing::debug;

/// Label for the schema source in messages.
pub fn schema_source(path: Option<&Path>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "(built-in)".to_string(),
    }
}

/// Load the schema from `path`, or the built-in document.
pub fn load_schema(path: Option<&Path>) -> Result<Schema> {
    if let Some(p) = path {
        if !p.exists() {
            return Err(HelpfulError::schema_not_found(p).into());
        }
    }
    let loaded = match path {
        Some(p) => Schema::load_path(p),
        None => Schema::builtin(),
    };
    match loaded {
        Ok(schema) => Ok(schema),
        Err(SchemaError::Validation(e)) => {
            Err(HelpfulError::invalid_schema(&schema_source(path), e.violations.len()).into())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load schema {}", schema_source(path))),
    }
}

/// Open the settings file under the roster home, seeding it from `schema`
/// on first use.
pub fn open_settings(schema: &Schema) -> Result<ConfigStore> {
    let path = roster_logging::settings_path()?;
    debug!(path = %path.display(), "Opening settings");
    let seeds = seeds_from_schema(schema).context("Schema declares invalid settings seeds")?;
    ConfigStore::open(&path, seeds)
        .with_context(|| format!("Failed to open settings file {}", path.display()))
}

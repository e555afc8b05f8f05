//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    // === Common error constructors ===

    /// Schema document failed validation
    pub fn invalid_schema(source: &str, violations: usize) -> Self {
        Self::new(format!(
            "Schema {} failed validation with {} violation(s)",
            source, violations
        ))
        .with_context("Nothing was initialized from this document")
        .with_suggestion(format!(
            "TRY: List the violations: roster schema check{}",
            if source == "(built-in)" {
                String::new()
            } else {
                format!(" --schema {}", source)
            }
        ))
    }

    /// Schema file missing
    pub fn schema_not_found(path: &Path) -> Self {
        Self::new(format!("Schema file not found: {}", path.display()))
            .with_suggestion("TRY: Omit --schema to use the built-in document")
            .with_suggestion("TRY: Unset ROSTER_SCHEMA if it points at a moved file")
    }

    /// Unknown setting key
    pub fn setting_not_found(key: &str) -> Self {
        Self::new(format!("Setting not found: {}", key))
            .with_suggestion("TRY: List available settings: roster config list")
    }

    /// Write to a read-only setting
    pub fn read_only_setting(key: &str) -> Self {
        Self::new(format!("Setting '{}' is read-only", key))
            .with_context("System settings can be read but not changed")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stderr.
pub fn print_json_error(err: &anyhow::Error) {
    let value = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({
            "error": format!("{:#}", err),
        }),
    };
    eprintln!("{}", value);
}

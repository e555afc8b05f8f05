//! Setting entries and key pointers.

use crate::error::{ConfigError, Result};
use roster_schema::{Schema, SettingCategory, SettingType, TypedValue};
use serde::{Deserialize, Serialize};

/// Table whose seed rows become settings.
pub const SETTINGS_TABLE: &str = "setting";

/// A typed, named setting.
///
/// `key` and `setting_type` are fixed when the entry is created; only the
/// stored value changes afterwards, and only through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    key: String,
    #[serde(default)]
    value: String,
    #[serde(rename = "type")]
    setting_type: SettingType,
    category: SettingCategory,
    label: String,
    #[serde(default)]
    help_text: Option<String>,
    #[serde(default = "default_editable")]
    editable: bool,
}

fn default_editable() -> bool {
    true
}

impl ConfigEntry {
    /// Create an editable entry holding `value`.
    pub fn new(
        key: impl Into<String>,
        category: SettingCategory,
        label: impl Into<String>,
        value: TypedValue,
    ) -> Self {
        Self {
            key: key.into(),
            setting_type: value.setting_type(),
            value: value.to_text(),
            category,
            label: label.into(),
            help_text: None,
            editable: true,
        }
    }

    /// Mark the entry as a read-only system value.
    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw stored text.
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    pub fn setting_type(&self) -> SettingType {
        self.setting_type
    }

    pub fn category(&self) -> SettingCategory {
        self.category
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Parse the stored text under the declared type.
    pub fn typed_value(&self) -> Result<TypedValue> {
        TypedValue::parse(self.setting_type, &self.value)
            .map_err(|e| ConfigError::parse(&self.key, e))
    }

    pub(crate) fn replace_value(&mut self, value: &TypedValue) {
        self.value = value.to_text();
    }

    pub(crate) fn restore_raw(&mut self, raw: String) {
        self.value = raw;
    }
}

/// A setting whose value names another setting.
///
/// Used for "active selection" settings such as the VAT rate in use: the
/// pointer is read first, then the key it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPointer {
    pointer_key: String,
    target_key: String,
}

impl KeyPointer {
    pub(crate) fn new(pointer_key: impl Into<String>, target_key: impl Into<String>) -> Self {
        Self {
            pointer_key: pointer_key.into(),
            target_key: target_key.into(),
        }
    }

    /// Key of the pointer entry itself.
    pub fn pointer_key(&self) -> &str {
        &self.pointer_key
    }

    /// Key the pointer currently names.
    pub fn target_key(&self) -> &str {
        &self.target_key
    }
}

/// Build the seed entries declared by the schema's settings table.
pub fn seeds_from_schema(schema: &Schema) -> Result<Vec<ConfigEntry>> {
    schema
        .seed_rows(SETTINGS_TABLE)
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let entry: ConfigEntry = serde_json::from_value(serde_json::Value::Object(row.clone()))
                .map_err(|e| ConfigError::InvalidSeed {
                    index,
                    message: e.to_string(),
                })?;
            entry.typed_value().map_err(|e| ConfigError::InvalidSeed {
                index,
                message: e.to_string(),
            })?;
            Ok(entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_from_builtin_schema() {
        let schema = Schema::builtin().unwrap();
        let seeds = seeds_from_schema(&schema).unwrap();
        assert_eq!(seeds.len(), 10);

        let pointer = seeds.iter().find(|e| e.key() == "vat_active_key").unwrap();
        assert_eq!(pointer.setting_type(), SettingType::String);
        assert_eq!(pointer.raw_value(), "vat_standard");
        assert!(pointer.help_text().is_some());

        let version = seeds.iter().find(|e| e.key() == "db_version").unwrap();
        assert!(!version.is_editable());
        assert_eq!(version.typed_value().unwrap(), TypedValue::Number(1.0));
    }

    #[test]
    fn test_entry_from_seed_row_defaults() {
        let entry: ConfigEntry = serde_json::from_str(
            r#"{ "key": "print_footer", "type": "string", "category": "print", "label": "Footer" }"#,
        )
        .unwrap();
        assert!(entry.is_editable());
        assert_eq!(entry.raw_value(), "");
        assert_eq!(entry.category(), SettingCategory::Print);
    }

    #[test]
    fn test_typed_value_reports_key_on_parse_failure() {
        let entry: ConfigEntry = serde_json::from_str(
            r#"{ "key": "vat_standard", "value": "nineteen", "type": "number", "category": "finance", "label": "VAT" }"#,
        )
        .unwrap();
        match entry.typed_value() {
            Err(ConfigError::Parse { key, .. }) => assert_eq!(key, "vat_standard"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}

//! Config command - read and change settings

use super::error::HelpfulError;
use super::output::print_table;
use anyhow::Result;
use clap::Subcommand;
use roster_config::{ConfigError, ConfigStore};
use roster_schema::SettingType;

/// Subcommands for settings
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// List all settings, grouped by category
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one setting
    Get {
        key: String,
        #[arg(long)]
        json: bool,
    },
    /// Change one setting (the value is parsed under the setting's type)
    Set { key: String, value: String },
    /// Follow a pointer setting to the setting it names
    Resolve {
        pointer: String,
        /// Type to parse the target value as
        #[arg(long = "type", default_value = "number")]
        setting_type: SettingType,
        #[arg(long)]
        json: bool,
    },
}

impl ConfigAction {
    pub fn wants_json(&self) -> bool {
        match self {
            ConfigAction::List { json }
            | ConfigAction::Get { json, .. }
            | ConfigAction::Resolve { json, .. } => *json,
            ConfigAction::Set { .. } => false,
        }
    }
}

/// Execute the config command
pub fn run(action: ConfigAction, store: &ConfigStore) -> Result<()> {
    match action {
        ConfigAction::List { json } => list(store, json),
        ConfigAction::Get { key, json } => {
            let entry = store.entry(&key).map_err(|e| explain(e, &key))?;
            let value = entry.typed_value().map_err(|e| explain(e, &key))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("{} = {} ({})", entry.key(), value, entry.setting_type());
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let parsed = store.set_text(&key, &value).map_err(|e| explain(e, &key))?;
            println!("{} = {}", key, parsed);
            Ok(())
        }
        ConfigAction::Resolve {
            pointer,
            setting_type,
            json,
        } => {
            let target = store.pointer(&pointer).map_err(|e| explain(e, &pointer))?;
            let value = store
                .resolve_indirect(&pointer, setting_type)
                .map_err(|e| explain(e, &pointer))?;
            if json {
                let report = serde_json::json!({
                    "pointer": pointer,
                    "target": target.target_key(),
                    "value": value,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} -> {} = {}", pointer, target.target_key(), value);
            }
            Ok(())
        }
    }
}

fn list(store: &ConfigStore, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&store.entries())?);
        return Ok(());
    }

    let rows = store
        .by_category()
        .into_iter()
        .flat_map(|(category, entries)| {
            entries.into_iter().map(move |e| {
                vec![
                    category.to_string(),
                    e.key().to_string(),
                    e.raw_value().to_string(),
                    e.setting_type().to_string(),
                    (if e.is_editable() { "" } else { "read-only" }).to_string(),
                    e.label().to_string(),
                ]
            })
        })
        .collect();
    print_table(&["Category", "Key", "Value", "Type", "", "Label"], rows);
    Ok(())
}

/// Turn the common settings errors into helpful ones.
fn explain(err: ConfigError, key: &str) -> anyhow::Error {
    match err {
        ConfigError::NotFound { key: missing } => HelpfulError::setting_not_found(&missing).into(),
        ConfigError::ReadOnlySetting { .. } => HelpfulError::read_only_setting(key).into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_config::ConfigEntry;
    use roster_schema::{SettingCategory, TypedValue};

    fn store() -> ConfigStore {
        ConfigStore::from_entries(vec![
            ConfigEntry::new("vat_standard", SettingCategory::Finance, "Standard", TypedValue::Number(19.0)),
            ConfigEntry::new(
                "vat_active_key",
                SettingCategory::Finance,
                "Active",
                TypedValue::String("vat_standard".into()),
            ),
            ConfigEntry::new("db_version", SettingCategory::Program, "Version", TypedValue::Number(1.0))
                .read_only(),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_parses_value() {
        let store = store();
        run(
            ConfigAction::Set {
                key: "vat_standard".into(),
                value: "20".into(),
            },
            &store,
        )
        .unwrap();
        assert_eq!(store.get("vat_standard").unwrap(), TypedValue::Number(20.0));
    }

    #[test]
    fn test_read_only_is_explained() {
        let err = run(
            ConfigAction::Set {
                key: "db_version".into(),
                value: "2".into(),
            },
            &store(),
        )
        .unwrap_err();
        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("read-only"));
    }

    #[test]
    fn test_missing_target_names_target_key() {
        let store = store();
        store
            .set("vat_active_key", TypedValue::String("vat_gone".into()))
            .unwrap();
        let err = run(
            ConfigAction::Resolve {
                pointer: "vat_active_key".into(),
                setting_type: SettingType::Number,
                json: false,
            },
            &store,
        )
        .unwrap_err();
        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("vat_gone"));
    }
}

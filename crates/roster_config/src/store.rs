//! The settings store.
//!
//! Entries are kept in memory behind a mutex. A store opened from a file
//! writes the full entry list back after every successful change; a failed
//! write rolls the in-memory value back so memory and disk never disagree.

use crate::entry::{ConfigEntry, KeyPointer};
use crate::error::{ConfigError, Result};
use roster_schema::{SettingCategory, SettingType, TypedValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

type Entries = BTreeMap<String, ConfigEntry>;

/// Typed key/value settings with two-level key indirection.
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: Mutex<Entries>,
    path: Option<PathBuf>,
}

/// Immutable copy of every entry, taken under the store lock.
///
/// Lets a caller perform several reads (a pointer and its target, say)
/// against one consistent state.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    entries: Entries,
}

impl ConfigStore {
    /// Empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory store holding `entries`.
    pub fn from_entries(entries: impl IntoIterator<Item = ConfigEntry>) -> Result<Self> {
        Ok(Self {
            entries: Mutex::new(collect_entries(entries)?),
            path: None,
        })
    }

    /// Open a file-backed store.
    ///
    /// An existing file is loaded as-is. A missing file is created from
    /// `seeds`.
    pub fn open(path: impl AsRef<Path>, seeds: Vec<ConfigEntry>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let list: Vec<ConfigEntry> = serde_json::from_str(&json)?;
            let entries = collect_entries(list)?;
            debug!(path = %path.display(), count = entries.len(), "Loaded settings");
            entries
        } else {
            let entries = collect_entries(seeds)?;
            write_file(&path, &entries)?;
            info!(path = %path.display(), count = entries.len(), "Created settings file from seeds");
            entries
        };

        Ok(Self {
            entries: Mutex::new(entries),
            path: Some(path),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert `seeds` if the store holds no entries yet.
    ///
    /// Returns the number of entries inserted. All seeds are checked before
    /// any is inserted.
    pub fn seed_if_empty(&self, seeds: Vec<ConfigEntry>) -> Result<usize> {
        let mut guard = self.lock();
        if !guard.is_empty() {
            debug!(existing = guard.len(), "Settings already present, skipping seed");
            return Ok(0);
        }

        let seeded = collect_entries(seeds)?;
        let count = seeded.len();
        *guard = seeded;
        if let Err(e) = self.persist(&guard) {
            guard.clear();
            return Err(e);
        }
        info!(count, "Seeded settings");
        Ok(count)
    }

    /// Read and parse one setting.
    pub fn get(&self, key: &str) -> Result<TypedValue> {
        read_value(&self.lock(), key)
    }

    /// Full entry for `key`.
    pub fn entry(&self, key: &str) -> Result<ConfigEntry> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::not_found(key))
    }

    /// Overwrite a setting with a typed value.
    ///
    /// The value must have the entry's declared type and the entry must be
    /// editable. On error the stored value is unchanged.
    pub fn set(&self, key: &str, value: TypedValue) -> Result<()> {
        let mut guard = self.lock();
        let entry = guard.get_mut(key).ok_or_else(|| ConfigError::not_found(key))?;

        if !entry.is_editable() {
            warn!(key, "Rejected write to read-only setting");
            return Err(ConfigError::read_only(key));
        }
        if value.setting_type() != entry.setting_type() {
            return Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: entry.setting_type(),
                got: value.setting_type(),
            });
        }
        // Stored text must read back under the declared type.
        TypedValue::parse(entry.setting_type(), &value.to_text())
            .map_err(|e| ConfigError::parse(key, e))?;

        let previous = entry.raw_value().to_string();
        entry.replace_value(&value);

        if let Err(e) = self.persist(&guard) {
            if let Some(entry) = guard.get_mut(key) {
                entry.restore_raw(previous);
            }
            warn!(key, error = %e, "Settings write failed, value restored");
            return Err(e);
        }

        info!(key, value = %value, "Setting updated");
        Ok(())
    }

    /// Overwrite a setting from text, parsed under the entry's declared type.
    pub fn set_text(&self, key: &str, text: &str) -> Result<TypedValue> {
        let setting_type = self.entry(key)?.setting_type();
        let value =
            TypedValue::parse(setting_type, text).map_err(|e| ConfigError::parse(key, e))?;
        self.set(key, value.clone())?;
        Ok(value)
    }

    /// Read a pointer entry. Its type must be `string`.
    pub fn pointer(&self, pointer_key: &str) -> Result<KeyPointer> {
        read_pointer(&self.lock(), pointer_key)
    }

    /// Follow a pointer entry to the setting it names and parse that
    /// setting's raw text as `expected`.
    pub fn resolve_indirect(&self, pointer_key: &str, expected: SettingType) -> Result<TypedValue> {
        resolve(&self.lock(), pointer_key, expected)
    }

    /// Follow a pointer to a number setting.
    pub fn resolve_number(&self, pointer_key: &str) -> Result<f64> {
        resolve_number(&self.lock(), pointer_key)
    }

    /// All entries, ordered by key.
    pub fn entries(&self) -> Vec<ConfigEntry> {
        self.lock().values().cloned().collect()
    }

    /// Entries grouped by category.
    pub fn by_category(&self) -> BTreeMap<SettingCategory, Vec<ConfigEntry>> {
        group(&self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            entries: self.lock().clone(),
        }
    }

    /// Write all entries to the backing file. No-op for in-memory stores.
    pub fn save(&self) -> Result<()> {
        self.persist(&self.lock())
    }

    fn persist(&self, entries: &Entries) -> Result<()> {
        match &self.path {
            Some(path) => write_file(path, entries),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Result<TypedValue> {
        read_value(&self.entries, key)
    }

    pub fn entry(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.get(key)
    }

    pub fn pointer(&self, pointer_key: &str) -> Result<KeyPointer> {
        read_pointer(&self.entries, pointer_key)
    }

    pub fn resolve_indirect(&self, pointer_key: &str, expected: SettingType) -> Result<TypedValue> {
        resolve(&self.entries, pointer_key, expected)
    }

    /// [`resolve_indirect`](Self::resolve_indirect) for a number setting.
    pub fn resolve_number(&self, pointer_key: &str) -> Result<f64> {
        resolve_number(&self.entries, pointer_key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.values()
    }

    pub fn by_category(&self) -> BTreeMap<SettingCategory, Vec<ConfigEntry>> {
        group(&self.entries)
    }
}

impl FromIterator<ConfigEntry> for ConfigSnapshot {
    /// Later entries replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = ConfigEntry>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|e| (e.key().to_string(), e))
                .collect(),
        }
    }
}

fn collect_entries(entries: impl IntoIterator<Item = ConfigEntry>) -> Result<Entries> {
    let mut map = Entries::new();
    for entry in entries {
        entry.typed_value()?;
        let key = entry.key().to_string();
        if map.insert(key.clone(), entry).is_some() {
            return Err(ConfigError::DuplicateKey(key));
        }
    }
    Ok(map)
}

fn read_value(entries: &Entries, key: &str) -> Result<TypedValue> {
    entries
        .get(key)
        .ok_or_else(|| ConfigError::not_found(key))?
        .typed_value()
}

fn read_pointer(entries: &Entries, pointer_key: &str) -> Result<KeyPointer> {
    let entry = entries
        .get(pointer_key)
        .ok_or_else(|| ConfigError::not_found(pointer_key))?;
    if entry.setting_type() != SettingType::String {
        return Err(ConfigError::TypeMismatch {
            key: pointer_key.to_string(),
            expected: SettingType::String,
            got: entry.setting_type(),
        });
    }
    Ok(KeyPointer::new(pointer_key, entry.raw_value()))
}

fn resolve(entries: &Entries, pointer_key: &str, expected: SettingType) -> Result<TypedValue> {
    let pointer = read_pointer(entries, pointer_key)?;
    let target = entries
        .get(pointer.target_key())
        .ok_or_else(|| ConfigError::not_found(pointer.target_key()))?;
    let value = TypedValue::parse(expected, target.raw_value())
        .map_err(|e| ConfigError::parse(pointer.target_key(), e))?;
    debug!(
        pointer = pointer_key,
        target = pointer.target_key(),
        value = %value,
        "Resolved indirect setting"
    );
    Ok(value)
}

fn resolve_number(entries: &Entries, pointer_key: &str) -> Result<f64> {
    let value = resolve(entries, pointer_key, SettingType::Number)?;
    value.as_number().ok_or_else(|| ConfigError::TypeMismatch {
        key: pointer_key.to_string(),
        expected: SettingType::Number,
        got: value.setting_type(),
    })
}

fn group(entries: &Entries) -> BTreeMap<SettingCategory, Vec<ConfigEntry>> {
    let mut groups: BTreeMap<SettingCategory, Vec<ConfigEntry>> = BTreeMap::new();
    for entry in entries.values() {
        groups.entry(entry.category()).or_default().push(entry.clone());
    }
    groups
}

/// Write via a sibling temp file and rename, so a crash never leaves a
/// truncated settings file behind.
fn write_file(path: &Path, entries: &Entries) -> Result<()> {
    let io_err = |source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let list: Vec<&ConfigEntry> = entries.values().collect();
    let json = serde_json::to_string_pretty(&list)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

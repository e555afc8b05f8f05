//! In-memory record store.
//!
//! Rows are checked against the schema on every write: field types,
//! nullability, maximum length, enum membership, minimums, foreign-key
//! existence and uniqueness. Deletes go through the
//! [`ReferentialIntegrityEnforcer`] and apply its plan under the same lock as
//! the lookup, so concurrent writers never see a half-applied delete.
//!
//! The settings table is not held here; `ConfigStore` owns those rows.

use crate::error::{RecordError, Result};
use crate::integrity::{DeletePlan, ReferenceLookup, ReferentialIntegrityEnforcer};
use crate::model::FromRecord;
use crate::value::{FromValue, Record, Value, ValueError};
use chrono::{DateTime, NaiveDate, Utc};
use roster_config::SETTINGS_TABLE;
use roster_ids::RowId;
use roster_schema::{FieldDef, FieldDefault, FieldType, Schema, TableDef, DATE_FORMAT};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug)]
struct TableRows {
    next_id: RowId,
    rows: BTreeMap<RowId, Record>,
}

impl Default for TableRows {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    by_name: BTreeMap<String, TableRows>,
}

impl Tables {
    fn rows(&self, table: &str) -> impl Iterator<Item = (&RowId, &Record)> {
        self.by_name.get(table).into_iter().flat_map(|t| t.rows.iter())
    }
}

impl ReferenceLookup for Tables {
    fn referencing_rows(&self, table: &str, field: &str, target: RowId) -> Vec<RowId> {
        let target = Value::Integer(target);
        self.rows(table)
            .filter(|(_, row)| row.get(field) == &target)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Schema-checked rows for every table of a [`Schema`].
#[derive(Debug)]
pub struct RecordStore {
    schema: Arc<Schema>,
    tables: Mutex<Tables>,
}

impl RecordStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        let by_name = schema
            .tables()
            .iter()
            .filter(|t| t.name != SETTINGS_TABLE)
            .map(|t| (t.name.clone(), TableRows::default()))
            .collect();
        Self {
            schema,
            tables: Mutex::new(Tables { by_name }),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Insert a row and return its new id.
    ///
    /// Fields missing from `record` take their declared default, or NULL.
    pub fn insert(&self, table: &str, record: Record) -> Result<RowId> {
        let def = self.table_def(table)?;
        let pk = primary_key(def)?;
        for (name, _) in record.iter() {
            writable_field(def, name)?;
        }

        let now = Utc::now();
        let mut row = Record::new();
        let mut guard = self.lock();

        for field in def.fields.iter().filter(|f| !f.primary_key) {
            let raw = if record.contains(&field.name) {
                record.get(&field.name).clone()
            } else {
                default_value(field, now).unwrap_or(Value::Null)
            };
            let value = coerce(table, field, raw)?;
            check_constraints(&guard, table, field, &value, None)?;
            row.set(field.name.clone(), value);
        }

        let rows = guard
            .by_name
            .get_mut(table)
            .ok_or_else(|| RecordError::UnknownTable(table.to_string()))?;
        let id = rows.next_id;
        rows.next_id += 1;
        row.set(pk.name.clone(), id);
        rows.rows.insert(id, row);

        debug!(table, id, "Row inserted");
        Ok(id)
    }

    pub fn get(&self, table: &str, id: RowId) -> Result<Record> {
        self.table_def(table)?;
        self.lock()
            .by_name
            .get(table)
            .and_then(|t| t.rows.get(&id))
            .cloned()
            .ok_or_else(|| RecordError::not_found(table, id))
    }

    /// Load a row as a typed model.
    pub fn load<T: FromRecord>(&self, id: RowId) -> Result<T> {
        T::from_record(&self.get(T::TABLE, id)?)
    }

    /// All rows of `table`, ordered by id.
    pub fn rows(&self, table: &str) -> Result<Vec<Record>> {
        self.table_def(table)?;
        Ok(self.lock().rows(table).map(|(_, r)| r.clone()).collect())
    }

    pub fn count(&self, table: &str) -> Result<usize> {
        self.table_def(table)?;
        Ok(self.lock().rows(table).count())
    }

    /// Change one field of an existing row.
    pub fn update_field(
        &self,
        table: &str,
        id: RowId,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.update_fields(table, id, Record::new().with(field, value))
    }

    /// Change several fields of an existing row. All changes are checked
    /// before any is applied.
    pub fn update_fields(&self, table: &str, id: RowId, changes: Record) -> Result<()> {
        let def = self.table_def(table)?;
        let mut guard = self.lock();
        if !guard
            .by_name
            .get(table)
            .map_or(false, |t| t.rows.contains_key(&id))
        {
            return Err(RecordError::not_found(table, id));
        }

        let mut checked = Vec::new();
        for (name, raw) in changes.iter() {
            let field = writable_field(def, name)?;
            let value = coerce(table, field, raw.clone())?;
            check_constraints(&guard, table, field, &value, Some(id))?;
            checked.push((name.to_string(), value));
        }

        let row = guard
            .by_name
            .get_mut(table)
            .and_then(|t| t.rows.get_mut(&id))
            .ok_or_else(|| RecordError::not_found(table, id))?;
        let fields: Vec<String> = checked.iter().map(|(n, _)| n.clone()).collect();
        for (name, value) in checked {
            row.set(name, value);
        }

        debug!(table, id, fields = ?fields, "Row updated");
        Ok(())
    }

    /// Delete a row, applying the deletion policy of every relation that
    /// points at it. Returns the applied plan.
    ///
    /// A refused delete changes nothing.
    pub fn delete(&self, table: &str, id: RowId) -> Result<DeletePlan> {
        self.table_def(table)?;
        let mut guard = self.lock();
        if !guard
            .by_name
            .get(table)
            .map_or(false, |t| t.rows.contains_key(&id))
        {
            return Err(RecordError::not_found(table, id));
        }

        let plan = ReferentialIntegrityEnforcer::new(&self.schema).before_delete(table, id, &*guard)?;

        for set in &plan.clear {
            if let Some(source) = guard.by_name.get_mut(&set.from.table) {
                for row_id in &set.rows {
                    if let Some(row) = source.rows.get_mut(row_id) {
                        row.set(set.from.field.clone(), Value::Null);
                    }
                }
            }
        }
        if let Some(rows) = guard.by_name.get_mut(table) {
            rows.rows.remove(&id);
        }

        info!(table, id, cleared = plan.cleared_count(), "Row deleted");
        Ok(plan)
    }

    fn table_def(&self, table: &str) -> Result<&TableDef> {
        if table == SETTINGS_TABLE {
            return Err(RecordError::SettingsTable(table.to_string()));
        }
        self.schema
            .table(table)
            .ok_or_else(|| RecordError::UnknownTable(table.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn primary_key(def: &TableDef) -> Result<&FieldDef> {
    def.primary_key()
        .ok_or_else(|| RecordError::UnknownTable(def.name.clone()))
}

/// A stored, non-key field of `def`.
fn writable_field<'a>(def: &'a TableDef, name: &str) -> Result<&'a FieldDef> {
    if def.computed_field(name).is_some() {
        return Err(RecordError::ComputedField {
            table: def.name.clone(),
            field: name.to_string(),
        });
    }
    let field = def.field(name).ok_or_else(|| RecordError::UnknownField {
        table: def.name.clone(),
        field: name.to_string(),
    })?;
    if field.primary_key {
        return Err(RecordError::PrimaryKeyAssigned {
            table: def.name.clone(),
            field: name.to_string(),
        });
    }
    Ok(field)
}

fn default_value(field: &FieldDef, now: DateTime<Utc>) -> Option<Value> {
    let default = field.default.as_ref()?;
    Some(match default {
        d if d.is_current_timestamp() => Value::Timestamp(now),
        d if d.is_current_date() => Value::Date(now.date_naive()),
        FieldDefault::Flag(b) => Value::Boolean(*b),
        FieldDefault::Number(n) if field.field_type == FieldType::Integer => Value::Integer(*n as i64),
        FieldDefault::Number(n) => Value::Real(*n),
        FieldDefault::Text(t) => Value::Text(t.clone()),
    })
}

/// Bring `value` into the storage form of `field`'s type.
fn coerce(table: &str, field: &FieldDef, value: Value) -> Result<Value> {
    let invalid = |source| RecordError::invalid(table, &field.name, source);
    let format_err = |text: &str| {
        invalid(ValueError::Format {
            expected: field.field_type.as_str(),
            text: text.to_string(),
        })
    };

    match (field.field_type, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::Integer, v @ Value::Integer(_)) => Ok(v),
        (FieldType::Real, Value::Real(v)) if !v.is_finite() => Err(format_err(&v.to_string())),
        (FieldType::Real, v @ (Value::Real(_) | Value::Integer(_))) => {
            f64::from_value(&v).map(Value::Real).map_err(invalid)
        }
        (FieldType::Text, v @ Value::Text(_)) => Ok(v),
        (FieldType::Boolean, v) => bool::from_value(&v).map(Value::Boolean).map_err(invalid),
        (FieldType::Date, v @ Value::Date(_)) => Ok(v),
        (FieldType::Date, Value::Text(t)) => NaiveDate::parse_from_str(&t, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| format_err(&t)),
        (FieldType::Datetime, v @ Value::Timestamp(_)) => Ok(v),
        (FieldType::Datetime, Value::Text(t)) => DateTime::parse_from_rfc3339(&t)
            .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
            .map_err(|_| format_err(&t)),
        (field_type, v) => Err(invalid(ValueError::Type {
            expected: field_type.as_str(),
            found: v.kind(),
        })),
    }
}

fn check_constraints(
    tables: &Tables,
    table: &str,
    field: &FieldDef,
    value: &Value,
    exclude: Option<RowId>,
) -> Result<()> {
    let name = field.name.as_str();

    if value.is_null() {
        return if field.nullable {
            Ok(())
        } else {
            Err(RecordError::required(table, name))
        };
    }

    if let (Some(max), Value::Text(text)) = (field.max_length, value) {
        let len = text.chars().count();
        if len > max {
            return Err(RecordError::TooLong {
                table: table.to_string(),
                field: name.to_string(),
                max,
                len,
            });
        }
    }

    if let Some(allowed) = &field.allowed_values {
        let text = value.to_string();
        if !allowed.iter().any(|a| *a == text) {
            return Err(RecordError::NotAllowed {
                table: table.to_string(),
                field: name.to_string(),
                value: text,
            });
        }
    }

    if let (Some(min), Some(number)) = (field.min, value.as_real()) {
        if number < min {
            return Err(RecordError::BelowMinimum {
                table: table.to_string(),
                field: name.to_string(),
                min,
                value: number,
            });
        }
    }

    if let Some(fk) = &field.foreign_key {
        let exists = tables.rows(&fk.table).any(|(_, row)| row.get(&fk.field) == value);
        if !exists {
            return Err(RecordError::DanglingReference {
                table: table.to_string(),
                field: name.to_string(),
                target: fk.table.clone(),
                id: value.as_integer().unwrap_or_default(),
            });
        }
    }

    if field.unique {
        let taken = tables
            .rows(table)
            .any(|(id, row)| Some(*id) != exclude && row.get(name) == value);
        if taken {
            return Err(RecordError::Duplicate {
                table: table.to_string(),
                field: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    Ok(())
}

//! Field values and rows.
//!
//! A [`Record`] is one row of any table, keyed by field name. Values are
//! loosely typed on the way in and checked against the schema by the store;
//! typed access goes through [`FromValue`].

use chrono::{DateTime, NaiveDate, Utc};
use roster_ids::{IdParseError, MemberId, NoteId, PriceId, RowId, ServiceId, SettingId};
use roster_schema::{DomainParseError, Gender, Salutation, Term};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Storage-class name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Boolean(_) => "BOOLEAN",
            Value::Date(_) => "DATE",
            Value::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format(roster_schema::DATE_FORMAT)),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Conversion failure from a [`Value`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("value is NULL - use Option<T> for nullable fields")]
    Null,

    #[error("expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{text}' is not a valid {expected}")]
    Format { expected: &'static str, text: String },

    #[error(transparent)]
    Domain(#[from] DomainParseError),

    #[error(transparent)]
    Id(#[from] IdParseError),
}

impl ValueError {
    fn mismatch(expected: &'static str, value: &Value) -> Self {
        if value.is_null() {
            ValueError::Null
        } else {
            ValueError::Type {
                expected,
                found: value.kind(),
            }
        }
    }
}

/// Trait for converting from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueError>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_integer()
            .ok_or_else(|| ValueError::mismatch("INTEGER", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_real()
            .ok_or_else(|| ValueError::mismatch("REAL", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| ValueError::mismatch("TEXT", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Boolean(v) => Ok(*v),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            _ => Err(ValueError::mismatch("BOOLEAN", value)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        value
            .as_date()
            .ok_or_else(|| ValueError::mismatch("DATE", value))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            _ => Err(ValueError::mismatch("TIMESTAMP", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

macro_rules! id_value {
    ($($id:ident),* $(,)?) => {
        $(
            impl FromValue for $id {
                fn from_value(value: &Value) -> Result<Self, ValueError> {
                    Ok($id::new(i64::from_value(value)?)?)
                }
            }

            impl From<$id> for Value {
                fn from(id: $id) -> Self {
                    Value::Integer(id.get())
                }
            }
        )*
    };
}

id_value!(NoteId, SettingId, PriceId, ServiceId, MemberId);

macro_rules! domain_value {
    ($($domain:ident),* $(,)?) => {
        $(
            impl FromValue for $domain {
                fn from_value(value: &Value) -> Result<Self, ValueError> {
                    let text = value
                        .as_text()
                        .ok_or_else(|| ValueError::mismatch("TEXT", value))?;
                    Ok($domain::parse(text)?)
                }
            }

            impl From<$domain> for Value {
                fn from(v: $domain) -> Self {
                    Value::Text(v.as_str().to_string())
                }
            }
        )*
    };
}

domain_value!(Term, Salutation, Gender);

/// One row, keyed by field name. Missing fields read as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

static NULL: Value = Value::Null;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style set.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn get_as<T: FromValue>(&self, field: &str) -> Result<T, ValueError> {
        T::from_value(self.get(field))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Row id under the conventional `id` primary key.
    pub fn id(&self) -> Option<RowId> {
        self.get("id").as_integer()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

//! Typed setting values.
//!
//! Settings are stored as text next to a [`SettingType`] tag. Each tag has one
//! parse function and one format function; a value that does not parse is an
//! error, never coerced to a default.

use crate::domain::SettingType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical text format for stored dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
}

/// Stored text that does not parse under its declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{text}' is not a valid {expected} value: {reason}")]
pub struct ValueParseError {
    pub expected: SettingType,
    pub text: String,
    pub reason: String,
}

impl ValueParseError {
    fn new(expected: SettingType, text: &str, reason: impl Into<String>) -> Self {
        Self {
            expected,
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

impl TypedValue {
    /// Parse stored text according to its declared type.
    pub fn parse(setting_type: SettingType, text: &str) -> Result<Self, ValueParseError> {
        match setting_type {
            SettingType::String => Ok(TypedValue::String(text.to_string())),
            SettingType::Number => parse_number(text).map(TypedValue::Number),
            SettingType::Boolean => parse_boolean(text).map(TypedValue::Boolean),
            SettingType::Date => parse_date(text).map(TypedValue::Date),
        }
    }

    /// The type tag this value belongs to.
    pub fn setting_type(&self) -> SettingType {
        match self {
            TypedValue::String(_) => SettingType::String,
            TypedValue::Number(_) => SettingType::Number,
            TypedValue::Boolean(_) => SettingType::Boolean,
            TypedValue::Date(_) => SettingType::Date,
        }
    }

    /// Render the value in its canonical stored text form.
    ///
    /// `TypedValue::parse(v.setting_type(), &v.to_text())` yields `v` again.
    pub fn to_text(&self) -> String {
        match self {
            TypedValue::String(s) => s.clone(),
            TypedValue::Number(n) => n.to_string(),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            TypedValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

fn parse_number(text: &str) -> Result<f64, ValueParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValueParseError::new(SettingType::Number, text, "empty"));
    }
    let n: f64 = trimmed
        .parse()
        .map_err(|e: std::num::ParseFloatError| ValueParseError::new(SettingType::Number, text, e.to_string()))?;
    if !n.is_finite() {
        return Err(ValueParseError::new(SettingType::Number, text, "not finite"));
    }
    Ok(n)
}

fn parse_boolean(text: &str) -> Result<bool, ValueParseError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ValueParseError::new(
            SettingType::Boolean,
            text,
            "expected true, false, 1 or 0",
        )),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, ValueParseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| ValueParseError::new(SettingType::Date, text, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_type() {
        assert_eq!(
            TypedValue::parse(SettingType::Number, "19").unwrap(),
            TypedValue::Number(19.0)
        );
        assert_eq!(
            TypedValue::parse(SettingType::Number, "-2.5").unwrap(),
            TypedValue::Number(-2.5)
        );
        assert_eq!(
            TypedValue::parse(SettingType::Boolean, "0").unwrap(),
            TypedValue::Boolean(false)
        );
        assert_eq!(
            TypedValue::parse(SettingType::Date, "2026-01-15").unwrap(),
            TypedValue::Date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
        );
        assert_eq!(
            TypedValue::parse(SettingType::String, "").unwrap(),
            TypedValue::String(String::new())
        );
    }

    #[test]
    fn test_parse_failures_are_explicit() {
        assert!(TypedValue::parse(SettingType::Number, "abc").is_err());
        assert!(TypedValue::parse(SettingType::Number, "").is_err());
        assert!(TypedValue::parse(SettingType::Number, "NaN").is_err());
        assert!(TypedValue::parse(SettingType::Boolean, "yes").is_err());
        assert!(TypedValue::parse(SettingType::Date, "15.01.2026").is_err());

        let err = TypedValue::parse(SettingType::Number, "nineteen").unwrap_err();
        assert_eq!(err.expected, SettingType::Number);
        assert_eq!(err.text, "nineteen");
    }

    #[test]
    fn test_text_form_reparses() {
        let values = [
            TypedValue::Number(19.0),
            TypedValue::Number(7.5),
            TypedValue::Boolean(true),
            TypedValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            TypedValue::String("Musterstraße 1".to_string()),
        ];
        for value in values {
            let text = value.to_text();
            assert_eq!(TypedValue::parse(value.setting_type(), &text).unwrap(), value);
        }
        assert_eq!(TypedValue::Number(19.0).to_text(), "19");
    }
}

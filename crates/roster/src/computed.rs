//! Computed fields.
//!
//! Computed fields are never stored. They are recomputed on every read from
//! the row and a settings snapshot, so a rate change is visible on the next
//! read without touching any row.

use crate::value::{Record, Value, ValueError};
use chrono::NaiveDate;
use roster_config::{ConfigError, ConfigSnapshot};
use roster_schema::{ComputedFieldDef, ComputedKind, Schema};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::trace;

/// Pointer setting used for net amounts when the document names none.
pub const DEFAULT_RATE_POINTER: &str = "vat_active_key";

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Error)]
pub enum ComputedFieldError {
    #[error("Unknown computed field: {table}.{field}")]
    UnknownField { table: String, field: String },

    /// `1 + rate / 100` would be zero or negative
    #[error("Tax rate {rate} is not above -100")]
    InvalidRate { rate: f64 },

    #[error("Gross amount {0} is negative")]
    NegativeAmount(f64),

    #[error("Birth date {birth_date} is after {reference}")]
    BirthDateInFuture {
        birth_date: NaiveDate,
        reference: NaiveDate,
    },

    #[error("{table}.{field}: {source}")]
    Source {
        table: String,
        field: String,
        #[source]
        source: ValueError,
    },

    #[error("Setting lookup failed: {0}")]
    Config(#[from] ConfigError),
}

/// `gross / (1 + rate / 100)`.
pub fn net_amount(gross: f64, rate: f64) -> Result<f64, ComputedFieldError> {
    if gross < 0.0 {
        return Err(ComputedFieldError::NegativeAmount(gross));
    }
    if rate <= -100.0 {
        return Err(ComputedFieldError::InvalidRate { rate });
    }
    Ok(gross / (1.0 + rate / 100.0))
}

/// Whole years between `birth_date` and `reference`, counting a year as
/// 365.25 days.
pub fn age(birth_date: NaiveDate, reference: NaiveDate) -> Result<u32, ComputedFieldError> {
    let days = (reference - birth_date).num_days();
    if days < 0 {
        return Err(ComputedFieldError::BirthDateInFuture {
            birth_date,
            reference,
        });
    }
    Ok((days as f64 / DAYS_PER_YEAR).floor() as u32)
}

/// Resolves the computed fields a schema declares.
#[derive(Debug, Clone, Copy)]
pub struct ComputedFieldResolver<'a> {
    schema: &'a Schema,
}

impl<'a> ComputedFieldResolver<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Every computed field of `table` for one row. An absent value (age
    /// without a birth date) maps to `None`.
    pub fn resolve(
        &self,
        table: &str,
        record: &Record,
        config: &ConfigSnapshot,
        reference_date: NaiveDate,
    ) -> Result<BTreeMap<String, Option<Value>>, ComputedFieldError> {
        self.schema
            .computed_fields(table)
            .iter()
            .map(|def| {
                let value = self.compute(table, def, record, config, reference_date)?;
                Ok((def.name.clone(), value))
            })
            .collect()
    }

    /// One computed field by name.
    pub fn resolve_field(
        &self,
        table: &str,
        field: &str,
        record: &Record,
        config: &ConfigSnapshot,
        reference_date: NaiveDate,
    ) -> Result<Option<Value>, ComputedFieldError> {
        let def = self
            .schema
            .table(table)
            .and_then(|t| t.computed_field(field))
            .ok_or_else(|| ComputedFieldError::UnknownField {
                table: table.to_string(),
                field: field.to_string(),
            })?;
        self.compute(table, def, record, config, reference_date)
    }

    fn compute(
        &self,
        table: &str,
        def: &ComputedFieldDef,
        record: &Record,
        config: &ConfigSnapshot,
        reference_date: NaiveDate,
    ) -> Result<Option<Value>, ComputedFieldError> {
        let source_err = |source| ComputedFieldError::Source {
            table: table.to_string(),
            field: def.source.clone(),
            source,
        };

        let value = match def.kind {
            ComputedKind::NetFromGross => {
                let Some(gross) = record.get_as::<Option<f64>>(&def.source).map_err(source_err)? else {
                    return Ok(None);
                };
                let pointer = def.rate_pointer.as_deref().unwrap_or(DEFAULT_RATE_POINTER);
                let rate = config.resolve_number(pointer)?;
                Some(Value::Real(net_amount(gross, rate)?))
            }
            ComputedKind::AgeInYears => {
                match record.get_as::<Option<NaiveDate>>(&def.source).map_err(source_err)? {
                    Some(birth) => Some(Value::Integer(age(birth, reference_date)? as i64)),
                    None => None,
                }
            }
        };

        trace!(table, field = %def.name, value = ?value, "Computed field resolved");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_config::ConfigEntry;
    use roster_schema::{SettingCategory, TypedValue};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(active: &str) -> ConfigSnapshot {
        [
            ConfigEntry::new("vat_standard", SettingCategory::Finance, "Standard", TypedValue::Number(19.0)),
            ConfigEntry::new("vat_reduced", SettingCategory::Finance, "Reduced", TypedValue::Number(7.0)),
            ConfigEntry::new(
                "vat_active_key",
                SettingCategory::Finance,
                "Active rate",
                TypedValue::String(active.to_string()),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_net_amount_inverts_gross() {
        for (gross, rate) in [(119.0, 19.0), (0.0, 7.0), (10.0, 0.0), (99.99, -50.0), (1e6, 250.0)] {
            let net = net_amount(gross, rate).unwrap();
            assert!((net * (1.0 + rate / 100.0) - gross).abs() < 1e-9);
        }
    }

    #[test]
    fn test_net_amount_rejects_bad_inputs() {
        assert!(matches!(net_amount(10.0, -100.0), Err(ComputedFieldError::InvalidRate { .. })));
        assert!(matches!(net_amount(-0.01, 19.0), Err(ComputedFieldError::NegativeAmount(_))));
    }

    #[test]
    fn test_age_boundaries() {
        assert_eq!(age(date(1990, 5, 1), date(2026, 5, 1)).unwrap(), 36);
        assert_eq!(age(date(1990, 5, 1), date(2026, 4, 30)).unwrap(), 35);
        assert_eq!(age(date(2026, 1, 1), date(2026, 1, 1)).unwrap(), 0);
        assert!(matches!(
            age(date(2027, 1, 1), date(2026, 1, 1)),
            Err(ComputedFieldError::BirthDateInFuture { .. })
        ));
    }

    #[test]
    fn test_resolve_price_uses_active_rate() {
        let schema = Schema::builtin().unwrap();
        let resolver = ComputedFieldResolver::new(&schema);
        let price = Record::new().with("id", 1).with("gross_amount", 107.0);

        let values = resolver
            .resolve("price", &price, &config("vat_reduced"), date(2026, 1, 1))
            .unwrap();
        match values["net_amount"] {
            Some(Value::Real(net)) => assert!((net - 100.0).abs() < 1e-9),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_rate_is_config_error() {
        let schema = Schema::builtin().unwrap();
        let price = Record::new().with("gross_amount", 10.0);
        let err = ComputedFieldResolver::new(&schema)
            .resolve_field("price", "net_amount", &price, &config("vat_zero"), date(2026, 1, 1))
            .unwrap_err();
        assert!(matches!(err, ComputedFieldError::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_age_absent_without_birth_date() {
        let schema = Schema::builtin().unwrap();
        let member = Record::new().with("name", "Muster").with("first_name", "Max");
        let age = ComputedFieldResolver::new(&schema)
            .resolve_field("member", "age", &member, &ConfigSnapshot::default(), date(2026, 1, 1))
            .unwrap();
        assert_eq!(age, None);
    }

    #[test]
    fn test_unknown_computed_field() {
        let schema = Schema::builtin().unwrap();
        let err = ComputedFieldResolver::new(&schema)
            .resolve_field("member", "shoe_size", &Record::new(), &ConfigSnapshot::default(), date(2026, 1, 1))
            .unwrap_err();
        assert!(matches!(err, ComputedFieldError::UnknownField { .. }));
    }
}

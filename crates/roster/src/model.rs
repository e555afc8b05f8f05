//! Typed views over stored rows.

use crate::error::{RecordError, Result};
use crate::value::{FromValue, Record};
use chrono::{DateTime, NaiveDate, Utc};
use roster_ids::{MemberId, NoteId, PriceId, ServiceId};
use roster_schema::{Gender, Salutation, Term};
use serde::Serialize;

/// A row type that can be read from a [`Record`].
pub trait FromRecord: Sized {
    const TABLE: &'static str;

    fn from_record(record: &Record) -> Result<Self>;
}

fn field<T: FromValue>(record: &Record, table: &str, name: &str) -> Result<T> {
    record
        .get_as(name)
        .map_err(|e| RecordError::invalid(table, name, e))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromRecord for Note {
    const TABLE: &'static str = "note";

    fn from_record(r: &Record) -> Result<Self> {
        Ok(Self {
            id: field(r, Self::TABLE, "id")?,
            title: field(r, Self::TABLE, "title")?,
            body: field(r, Self::TABLE, "body")?,
            created_at: field(r, Self::TABLE, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Price {
    pub id: PriceId,
    pub gross_amount: f64,
    pub note_id: Option<NoteId>,
}

impl FromRecord for Price {
    const TABLE: &'static str = "price";

    fn from_record(r: &Record) -> Result<Self> {
        Ok(Self {
            id: field(r, Self::TABLE, "id")?,
            gross_amount: field(r, Self::TABLE, "gross_amount")?,
            note_id: field(r, Self::TABLE, "note_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub price_id: PriceId,
    pub term: Term,
    pub note_id: Option<NoteId>,
}

impl FromRecord for Service {
    const TABLE: &'static str = "service";

    fn from_record(r: &Record) -> Result<Self> {
        Ok(Self {
            id: field(r, Self::TABLE, "id")?,
            name: field(r, Self::TABLE, "name")?,
            price_id: field(r, Self::TABLE, "price_id")?,
            term: field(r, Self::TABLE, "term")?,
            note_id: field(r, Self::TABLE, "note_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub salutation: Option<Salutation>,
    pub name: String,
    pub first_name: String,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub service_id: Option<ServiceId>,
    pub contract_booking_date: Option<NaiveDate>,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub note_id: Option<NoteId>,
}

impl FromRecord for Member {
    const TABLE: &'static str = "member";

    fn from_record(r: &Record) -> Result<Self> {
        let t = Self::TABLE;
        Ok(Self {
            id: field(r, t, "id")?,
            salutation: field(r, t, "salutation")?,
            name: field(r, t, "name")?,
            first_name: field(r, t, "first_name")?,
            postal_code: field(r, t, "postal_code")?,
            city: field(r, t, "city")?,
            phone1: field(r, t, "phone1")?,
            phone2: field(r, t, "phone2")?,
            email: field(r, t, "email")?,
            gender: field(r, t, "gender")?,
            birth_date: field(r, t, "birth_date")?,
            service_id: field(r, t, "service_id")?,
            contract_booking_date: field(r, t, "contract_booking_date")?,
            contract_start_date: field(r, t, "contract_start_date")?,
            contract_end_date: field(r, t, "contract_end_date")?,
            note_id: field(r, t, "note_id")?,
        })
    }
}

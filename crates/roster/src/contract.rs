//! Contract end-date auto-calculation.
//!
//! A [`ContractSession`] holds the contract fields of one member while a
//! dialog edits them. Changing the start date or the selected service fires
//! the end-date rule; editing the end date directly marks it as a user
//! override. A trigger always recomputes, even over an override.
//!
//! | event            | Clean      | Computed   | Overridden |
//! |------------------|------------|------------|------------|
//! | trigger          | Computed   | Computed   | Computed   |
//! | end-date edit    | Overridden | Overridden | Overridden |
//! | other field edit | Clean      | Computed   | Overridden |
//!
//! A trigger that fails leaves the session as it was. A trigger with the
//! start date or the term missing writes no end date; a `Computed` end date
//! then drops back to `Clean` since it no longer follows the inputs.

use crate::model::Member;
use crate::value::Record;
use chrono::{Days, Months, NaiveDate};
use roster_ids::ServiceId;
use roster_schema::Term;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("End date for a {term} contract starting {start} is out of range")]
    OutOfRange { start: NaiveDate, term: Term },
}

/// Last day of a contract starting on `start` with billing `term`.
///
/// One-off contracts end on the start date. Otherwise the term is added in
/// calendar months, clamped to the last day of the target month, then one
/// day is subtracted: 2026-01-31 monthly ends 2026-02-27.
pub fn end_date(start: NaiveDate, term: Term) -> Result<NaiveDate, ContractError> {
    if term == Term::OneOff {
        return Ok(start);
    }
    start
        .checked_add_months(Months::new(term.months()))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or(ContractError::OutOfRange { start, term })
}

/// Provenance of the end date held by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndDateState {
    /// Not touched since the session opened
    Clean,
    /// Written by the rule
    Computed,
    /// Edited by the user after opening or after the last computation
    Overridden,
}

/// Service picked in the dialog, with the term that drives the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedService {
    pub id: ServiceId,
    pub term: Term,
}

/// Contract fields as settled at submit time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractFields {
    pub booking_date: Option<NaiveDate>,
    pub service: Option<SelectedService>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub state: EndDateState,
}

impl ContractFields {
    /// Member columns to write back.
    pub fn to_record(&self) -> Record {
        Record::new()
            .with("contract_booking_date", self.booking_date)
            .with("service_id", self.service.map(|s| s.id))
            .with("contract_start_date", self.start_date)
            .with("contract_end_date", self.end_date)
    }
}

/// Edit state of one contract dialog.
#[derive(Debug, Clone)]
pub struct ContractSession {
    booking_date: Option<NaiveDate>,
    service: Option<SelectedService>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    state: EndDateState,
}

impl ContractSession {
    /// "Start contract" dialog: booking and start date default to `today`.
    pub fn new_contract(today: NaiveDate) -> Self {
        Self {
            booking_date: Some(today),
            service: None,
            start_date: Some(today),
            end_date: None,
            state: EndDateState::Clean,
        }
    }

    /// Edit an existing member's contract. `term` is the term of the
    /// member's current service, if any.
    pub fn open(member: &Member, term: Option<Term>) -> Self {
        Self {
            booking_date: member.contract_booking_date,
            service: member
                .service_id
                .zip(term)
                .map(|(id, term)| SelectedService { id, term }),
            start_date: member.contract_start_date,
            end_date: member.contract_end_date,
            state: EndDateState::Clean,
        }
    }

    pub fn state(&self) -> EndDateState {
        self.state
    }

    pub fn booking_date(&self) -> Option<NaiveDate> {
        self.booking_date
    }

    pub fn service(&self) -> Option<SelectedService> {
        self.service
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Change the start date. Fires the rule.
    pub fn set_start_date(&mut self, start: Option<NaiveDate>) -> Result<(), ContractError> {
        let end = self.rule(start, self.service, "contract_start_date")?;
        self.start_date = start;
        self.settle(end);
        Ok(())
    }

    /// Change the selected service. Fires the rule.
    pub fn select_service(&mut self, service: Option<SelectedService>) -> Result<(), ContractError> {
        let end = self.rule(self.start_date, service, "service_id")?;
        self.service = service;
        self.settle(end);
        Ok(())
    }

    /// Direct edit of the end date. Kept until the next trigger.
    pub fn set_end_date(&mut self, end: Option<NaiveDate>) {
        self.end_date = end;
        self.state = EndDateState::Overridden;
        debug!(end = ?end, "Contract end date overridden");
    }

    /// Edit of a field the rule does not depend on.
    pub fn set_booking_date(&mut self, booking: Option<NaiveDate>) {
        self.booking_date = booking;
    }

    /// End the session and hand back the settled fields.
    pub fn submit(self) -> ContractFields {
        ContractFields {
            booking_date: self.booking_date,
            service: self.service,
            start_date: self.start_date,
            end_date: self.end_date,
            state: self.state,
        }
    }

    /// End the session without keeping any edit.
    pub fn discard(self) {}

    /// End date the rule yields for the candidate inputs, `None` when one
    /// is missing. Does not touch the session.
    fn rule(
        &self,
        start: Option<NaiveDate>,
        service: Option<SelectedService>,
        trigger: &str,
    ) -> Result<Option<NaiveDate>, ContractError> {
        let (Some(start), Some(service)) = (start, service) else {
            debug!(trigger, "End-date rule skipped, start date or term missing");
            return Ok(None);
        };
        let end = end_date(start, service.term)?;
        if self.state == EndDateState::Overridden {
            debug!(trigger, previous = ?self.end_date, "Recomputing over user override");
        }
        debug!(trigger, %start, term = %service.term, %end, "Contract end date computed");
        Ok(Some(end))
    }

    fn settle(&mut self, end: Option<NaiveDate>) {
        match end {
            Some(end) => {
                self.end_date = Some(end);
                self.state = EndDateState::Computed;
            }
            None if self.state == EndDateState::Computed => self.state = EndDateState::Clean,
            None => {}
        }
    }
}

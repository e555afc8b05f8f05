//! One schema, its settings and its rows, wired together.

use crate::computed::ComputedFieldResolver;
use crate::contract::{ContractFields, ContractSession};
use crate::error::RosterError;
use crate::model::{FromRecord, Member, Service};
use crate::store::RecordStore;
use crate::value::Value;
use chrono::NaiveDate;
use roster_config::{seeds_from_schema, ConfigStore};
use roster_ids::{MemberId, RowId};
use roster_schema::Schema;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub type Result<T> = std::result::Result<T, RosterError>;

#[derive(Debug)]
pub struct Roster {
    schema: Arc<Schema>,
    config: ConfigStore,
    records: RecordStore,
}

impl Roster {
    /// Wire `config` to `schema`, seeding the settings if the store is empty.
    pub fn new(schema: Schema, config: ConfigStore) -> Result<Self> {
        let seeded = config.seed_if_empty(seeds_from_schema(&schema)?)?;
        let schema = Arc::new(schema);
        info!(seeded, settings = config.len(), "Roster runtime ready");
        Ok(Self {
            records: RecordStore::new(Arc::clone(&schema)),
            schema,
            config,
        })
    }

    /// Shipped schema with in-memory settings.
    pub fn in_memory() -> Result<Self> {
        Self::new(Schema::builtin()?, ConfigStore::new())
    }

    /// `schema` with settings persisted at `settings_path`.
    pub fn open(schema: Schema, settings_path: impl AsRef<Path>) -> Result<Self> {
        let config = ConfigStore::open(settings_path, seeds_from_schema(&schema)?)?;
        Self::new(schema, config)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Computed fields of one stored row against current settings.
    pub fn computed(
        &self,
        table: &str,
        id: RowId,
        reference_date: NaiveDate,
    ) -> Result<BTreeMap<String, Option<Value>>> {
        let record = self.records.get(table, id)?;
        let snapshot = self.config.snapshot();
        Ok(ComputedFieldResolver::new(&self.schema).resolve(
            table,
            &record,
            &snapshot,
            reference_date,
        )?)
    }

    /// Contract session over a stored member.
    pub fn edit_contract(&self, member_id: MemberId) -> Result<ContractSession> {
        let member: Member = self.records.load(member_id.get())?;
        let term = match member.service_id {
            Some(id) => Some(self.records.load::<Service>(id.get())?.term),
            None => None,
        };
        Ok(ContractSession::open(&member, term))
    }

    /// Write submitted contract fields back to the member row.
    pub fn save_contract(&self, member_id: MemberId, fields: &ContractFields) -> Result<()> {
        self.records
            .update_fields(Member::TABLE, member_id.get(), fields.to_record())?;
        info!(
            member = %member_id,
            end = ?fields.end_date,
            state = ?fields.state,
            "Contract saved"
        );
        Ok(())
    }
}

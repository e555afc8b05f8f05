//! Referential integrity on delete.
//!
//! The enforcer only plans. Given a row about to be deleted, it walks every
//! foreign key the schema declares against that row's table and either
//! refuses the delete (a `RESTRICT` edge with referencing rows) or returns the
//! references to clear (`SET NULL` edges). Every restrict edge is checked
//! before any clear is planned, so a refused delete never has partial writes
//! to undo.
//!
//! Applying the plan and removing the row is the persistence side's job and
//! must happen under the same lock as the lookup.

use roster_ids::RowId;
use roster_schema::{FieldRef, OnDelete, Schema};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Read access to current foreign-key values.
pub trait ReferenceLookup {
    /// Ids of rows in `table` whose `field` equals `target`.
    fn referencing_rows(&self, table: &str, field: &str, target: RowId) -> Vec<RowId>;
}

/// Rows of one table referencing the deleted row through one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSet {
    pub from: FieldRef,
    pub rows: Vec<RowId>,
}

/// What must happen for a delete to go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    pub table: String,
    pub id: RowId,
    /// Foreign keys to set to NULL before the row is removed
    pub clear: Vec<ReferenceSet>,
}

impl DeletePlan {
    /// Number of individual foreign-key values the plan clears.
    pub fn cleared_count(&self) -> usize {
        self.clear.iter().map(|r| r.rows.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A `RESTRICT` relation still has referencing rows
    #[error("Cannot delete {table} {id}: still referenced by {}", describe(.referenced_by))]
    Restricted {
        table: String,
        id: RowId,
        referenced_by: Vec<ReferenceSet>,
    },

    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

fn describe(refs: &[ReferenceSet]) -> String {
    refs.iter()
        .map(|r| format!("{} ({} row(s))", r.from, r.rows.len()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Applies the deletion policies declared on foreign keys.
#[derive(Debug, Clone, Copy)]
pub struct ReferentialIntegrityEnforcer<'a> {
    schema: &'a Schema,
}

impl<'a> ReferentialIntegrityEnforcer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Plan the delete of row `id` in `table`.
    pub fn before_delete(
        &self,
        table: &str,
        id: RowId,
        lookup: &impl ReferenceLookup,
    ) -> Result<DeletePlan, IntegrityError> {
        if self.schema.table(table).is_none() {
            return Err(IntegrityError::UnknownTable(table.to_string()));
        }

        let mut restricted = Vec::new();
        let mut clear = Vec::new();

        for reference in self.schema.references_to(table) {
            let rows = lookup.referencing_rows(&reference.from.table, &reference.from.field, id);
            if rows.is_empty() {
                continue;
            }
            let set = ReferenceSet {
                from: reference.from,
                rows,
            };
            match reference.on_delete {
                OnDelete::Restrict => restricted.push(set),
                OnDelete::SetNull => clear.push(set),
            }
        }

        if !restricted.is_empty() {
            warn!(
                table,
                id,
                references = %describe(&restricted),
                "Delete refused by RESTRICT relation"
            );
            return Err(IntegrityError::Restricted {
                table: table.to_string(),
                id,
                referenced_by: restricted,
            });
        }

        let plan = DeletePlan {
            table: table.to_string(),
            id,
            clear,
        };
        debug!(table, id, cleared = plan.cleared_count(), "Delete planned");
        Ok(plan)
    }
}

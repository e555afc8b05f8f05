//! Roster runtime
//!
//! The parts of the member roster that are not plain storage:
//!
//! - [`computed`]: read-time derived fields (net amount, age)
//! - [`contract`]: contract end-date auto-calculation with override tracking
//! - [`integrity`]: deletion policies across relations
//! - [`store`]: schema-checked in-memory rows
//! - [`runtime`]: the [`Roster`] facade tying schema, settings and rows together
//!
//! Schema loading lives in `roster_schema`, settings in `roster_config`.

pub mod computed;
pub mod contract;
pub mod error;
pub mod integrity;
pub mod model;
pub mod runtime;
pub mod store;
pub mod value;

pub use computed::{ComputedFieldError, ComputedFieldResolver};
pub use contract::{ContractError, ContractFields, ContractSession, EndDateState, SelectedService};
pub use error::{RecordError, RosterError};
pub use integrity::{DeletePlan, IntegrityError, ReferenceLookup, ReferentialIntegrityEnforcer};
pub use model::{FromRecord, Member, Note, Price, Service};
pub use runtime::Roster;
pub use store::RecordStore;
pub use value::{FromValue, Record, Value, ValueError};

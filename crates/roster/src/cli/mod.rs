//! CLI module for Roster
//!
//! Thin wrappers over the runtime crates: every command loads the schema,
//! opens what it needs, prints, and exits.

pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod output;
pub mod paths;
pub mod price;
pub mod schema;

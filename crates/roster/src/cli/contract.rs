//! Contract command - contract end dates

use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use roster::contract::end_date;
use roster_schema::Term;

/// Subcommands for contracts
#[derive(Subcommand, Debug, Clone)]
pub enum ContractAction {
    /// End date of a contract from its start date and billing term
    End {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// one-off, monthly, quarterly or yearly
        #[arg(long)]
        term: Term,
        #[arg(long)]
        json: bool,
    },
}

impl ContractAction {
    pub fn wants_json(&self) -> bool {
        matches!(self, ContractAction::End { json: true, .. })
    }
}

/// Execute the contract command
pub fn run(action: ContractAction) -> Result<()> {
    match action {
        ContractAction::End { start, term, json } => {
            let end = end_date(start, term)?;
            if json {
                let report = serde_json::json!({
                    "start": start,
                    "term": term,
                    "end": end,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} {} -> {}", start, term, end);
            }
            Ok(())
        }
    }
}

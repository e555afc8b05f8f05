//! Price command - net amounts at the active VAT rate

use super::output::{format_amount, format_rate};
use anyhow::{Context, Result};
use clap::Subcommand;
use roster::computed::{net_amount, DEFAULT_RATE_POINTER};
use roster_config::ConfigStore;
use roster_schema::{ComputedKind, Schema};

/// Subcommands for prices
#[derive(Subcommand, Debug, Clone)]
pub enum PriceAction {
    /// Net amount of a gross amount at the active VAT rate
    Net {
        gross: f64,
        /// Pointer setting to read the rate through
        #[arg(long)]
        rate_pointer: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

impl PriceAction {
    pub fn wants_json(&self) -> bool {
        matches!(self, PriceAction::Net { json: true, .. })
    }
}

/// Pointer the schema declares for the price net amount.
pub fn declared_rate_pointer(schema: &Schema) -> String {
    schema
        .computed_fields("price")
        .iter()
        .find(|c| c.kind == ComputedKind::NetFromGross)
        .and_then(|c| c.rate_pointer.clone())
        .unwrap_or_else(|| DEFAULT_RATE_POINTER.to_string())
}

/// Execute the price command
pub fn run(action: PriceAction, schema: &Schema, store: &ConfigStore) -> Result<()> {
    match action {
        PriceAction::Net {
            gross,
            rate_pointer,
            json,
        } => {
            let pointer = rate_pointer.unwrap_or_else(|| declared_rate_pointer(schema));
            let snapshot = store.snapshot();
            let target = snapshot.pointer(&pointer)?;
            let rate = snapshot
                .resolve_number(&pointer)
                .with_context(|| format!("Failed to resolve rate through '{}'", pointer))?;
            let net = net_amount(gross, rate)?;

            if json {
                let report = serde_json::json!({
                    "gross": gross,
                    "rate": rate,
                    "rate_key": target.target_key(),
                    "net": net,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "gross {}  rate {} ({})  net {}",
                    format_amount(gross),
                    format_rate(rate),
                    target.target_key(),
                    format_amount(net)
                );
            }
            Ok(())
        }
    }
}

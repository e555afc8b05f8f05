//! Roster command-line launcher
//!
//! Validates schema documents, renders DDL, manages settings and evaluates
//! the runtime rules (net amounts, contract end dates) from the shell.

use anyhow::Result;
use clap::{Parser, Subcommand};
use roster_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Schema-driven member roster runtime", version)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Schema document to use instead of the built-in one
    #[arg(long, global = true, env = "ROSTER_SCHEMA")]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the schema document or render it as SQL
    Schema {
        #[command(subcommand)]
        action: cli::schema::SchemaAction,
    },

    /// Read and change settings
    Config {
        #[command(subcommand)]
        action: cli::config::ConfigAction,
    },

    /// Price calculations
    Price {
        #[command(subcommand)]
        action: cli::price::PriceAction,
    },

    /// Contract date calculations
    Contract {
        #[command(subcommand)]
        action: cli::contract::ContractAction,
    },

    /// Show home, settings and log paths
    Paths(cli::paths::PathsArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Schema { action } => action.wants_json(),
        Commands::Config { action } => action.wants_json(),
        Commands::Price { action } => action.wants_json(),
        Commands::Contract { action } => action.wants_json(),
        Commands::Paths(args) => args.json,
    }
}

fn run_command(cli: Cli) -> Result<()> {
    let schema_path = cli.schema.as_deref();
    debug!(command = ?cli.command, "Running command");

    match cli.command {
        Commands::Schema { action } => cli::schema::run(action, schema_path),
        Commands::Config { action } => {
            let schema = cli::context::load_schema(schema_path)?;
            let store = cli::context::open_settings(&schema)?;
            cli::config::run(action, &store)
        }
        Commands::Price { action } => {
            let schema = cli::context::load_schema(schema_path)?;
            let store = cli::context::open_settings(&schema)?;
            cli::price::run(action, &schema, &store)
        }
        Commands::Contract { action } => cli::contract::run(action),
        Commands::Paths(args) => cli::paths::run(args, schema_path),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "roster",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if err.downcast_ref::<cli::error::HelpfulError>().is_some() {
                eprint!("{}", err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}

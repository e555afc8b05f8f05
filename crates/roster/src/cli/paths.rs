//! Paths command - show where roster keeps its files

use super::context::schema_source;
use anyhow::Result;
use std::path::Path;

/// Arguments for the paths command
#[derive(Debug, clap::Args)]
pub struct PathsArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Execute the paths command
pub fn run(args: PathsArgs, schema_path: Option<&Path>) -> Result<()> {
    let home = roster_logging::roster_home()?;
    let settings = roster_logging::settings_path()?;
    let logs = roster_logging::logs_dir()?;
    let schema = schema_source(schema_path);

    if args.json {
        let report = serde_json::json!({
            "home": home.to_string_lossy(),
            "settings": {
                "path": settings.to_string_lossy(),
                "exists": settings.exists(),
            },
            "logs": {
                "path": logs.to_string_lossy(),
                "exists": logs.exists(),
            },
            "schema": schema,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("ROSTER PATHS");
        println!("============");
        println!();
        println!("Home:      {}", home.display());
        println!("Settings:  {}{}", settings.display(), missing(settings.exists()));
        println!("Logs:      {}{}", logs.display(), missing(logs.exists()));
        println!("Schema:    {}", schema);
        println!();
        println!("Override the home directory with {}", roster_logging::HOME_ENV);
    }
    Ok(())
}

fn missing(exists: bool) -> &'static str {
    if exists {
        ""
    } else {
        " (not created yet)"
    }
}

//! Inspect and exercise a prompt registry from the command line.
//!
//! # Examples
//!
//! ```sh
//! # List every prompt id and its versions
//! promptdeck --prompts-dir ./prompts list
//!
//! # Show the newest version of a prompt as JSON
//! promptdeck show greeting
//!
//! # Render a specific version with inputs
//! promptdeck render greeting --version 2.0.0 --inputs '{"name": "Ada"}'
//!
//! # Fold the usage log into per-prompt metrics
//! promptdeck --usage-log ./prompt_usage.jsonl metrics
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use promptdeck::{Registry, UsageLog, aggregate, render};
use serde_json::{Map, Value};

/// Inspect and exercise a prompt registry from the command line.
#[derive(Parser)]
#[command(name = "promptdeck")]
struct Cli {
    /// Directory of prompt definition documents
    #[arg(long, default_value = "prompts")]
    prompts_dir: PathBuf,

    /// Usage log file (JSONL)
    #[arg(long, default_value = "prompt_usage.jsonl")]
    usage_log: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List prompt ids with their registered versions, newest first
    List,

    /// Print a resolved definition as pretty JSON
    Show {
        /// Prompt id to resolve
        id: String,
        /// Exact version string; omit for the newest
        #[arg(long)]
        version: Option<String>,
    },

    /// Render a prompt against JSON inputs
    Render {
        /// Prompt id to resolve
        id: String,
        /// Exact version string; omit for the newest
        #[arg(long)]
        version: Option<String>,
        /// Template inputs as a JSON object
        #[arg(long, default_value = "{}")]
        inputs: String,
    },

    /// Fold the usage log into per-prompt metrics
    Metrics,
}

fn main() {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    if let Err(message) = run(&cli) {
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Command::List => {
            let registry = Registry::load(&cli.prompts_dir);
            for id in registry.ids() {
                let versions: Vec<&str> = registry
                    .versions(id)
                    .unwrap_or_default()
                    .iter()
                    .map(|d| d.version.as_str())
                    .collect();
                println!("{id}: {}", versions.join(", "));
            }
            if registry.skipped > 0 {
                eprintln!("({} documents skipped during load)", registry.skipped);
            }
            Ok(())
        }
        Command::Show { id, version } => {
            let registry = Registry::load(&cli.prompts_dir);
            let definition = registry
                .resolve(id, version.as_deref())
                .map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(definition)
                .map_err(|e| format!("Failed to serialize definition: {e}"))?;
            println!("{json}");
            Ok(())
        }
        Command::Render {
            id,
            version,
            inputs,
        } => {
            let variables: Map<String, Value> = serde_json::from_str(inputs)
                .map_err(|e| format!("--inputs must be a JSON object: {e}"))?;
            let registry = Registry::load(&cli.prompts_dir);
            let definition = registry
                .resolve(id, version.as_deref())
                .map_err(|e| e.to_string())?;
            let rendered = render(definition, &variables).map_err(|e| e.to_string())?;
            println!("{rendered}");
            Ok(())
        }
        Command::Metrics => {
            let log = UsageLog::new(&cli.usage_log);
            let metrics = aggregate(&log).map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&metrics)
                .map_err(|e| format!("Failed to serialize metrics: {e}"))?;
            println!("{json}");
            Ok(())
        }
    }
}

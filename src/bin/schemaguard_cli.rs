//! Schemaguard CLI
//!
//! Commands: rules, validate
//! Outputs JSON to stdout
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use schemaguard::{Schema, Validator};

#[derive(Parser)]
#[command(name = "schemaguard-cli")]
#[command(about = "Schemaguard CLI - Declarative Schema Validator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in rule names
    Rules,

    /// Validate a JSON payload against a schema file
    Validate {
        /// Path to a JSON schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// JSON payload to validate
        #[arg(short, long)]
        payload: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let validator = Validator::new();

    match cli.command {
        Commands::Rules => {
            let names = validator.rules().names();
            println!("{}", serde_json::to_string_pretty(&names).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Validate { schema, payload } => {
            let schema = match Schema::from_path(&schema) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to load schema: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let obj: serde_json::Value = match serde_json::from_str(&payload) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!(r#"{{"error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let report = validator.validate(&schema, &obj);
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
            if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            }
        }
    }
}

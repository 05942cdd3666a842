//! Environment variable validation tool.
//!
//! Validates the process environment against a declarative schema, scans it
//! for weak credentials and writes redacted reports.
//!
//! # Security Guarantees
//! - Values of sensitive fields are never printed, logged or exported
//! - Validation reads the environment only; it never modifies it

use std::sync::Arc;

use clap::Parser;
use envvar_validator::{Cli, execute};
use envvar_validator_core::{ProcessEnv, logging::init_logging};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let output = execute(&cli, Arc::new(ProcessEnv)).await.inspect_err(|e| {
        error!("{:#}", e);
    })?;

    print!("{}", output.text);

    if !output.success {
        std::process::exit(1);
    }

    Ok(())
}

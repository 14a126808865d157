//! pkgio CLI Binary
//!
//! Command-line interface for reading and rewriting configuration packages.

use anyhow::Context;
use clap::Parser;
use pkgio::cli::{Cli, RunContext};
use pkgio::logging::{init_logging, LoggingConfig};
use pkgio::PackageError;
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let root = cli.command.package_path();
    let context = RunContext::new(root, cli.config.clone())
        .with_context(|| format!("loading configuration for {}", root.display()))?;

    let logging_config = build_logging_config(cli, &context.config().logging)?;
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    debug!(command = ?cli.command, "pkgio starting");

    context
        .execute(&cli.command)
        .with_context(|| format!("processing package {}", root.display()))
}

/// Build logging configuration from CLI args over the loaded config.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, base: &LoggingConfig) -> Result<LoggingConfig, PackageError> {
    let mut config = base.clone();
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.parse()?;
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.parse()?;
    }
    Ok(config)
}

//! imgdep - Docker image dependency planner CLI
//!
//! Works out which images in a multi-image repository need rebuilding after
//! Dockerfiles change, and checks the package state of built images:
//! - rebuild sets in build order, filtered by Python version
//! - conda pinned/requested package checks
//! - apt package checks
//! - test selection along the image lineage

use clap::Parser;
use imgdep::cli::CliArgs;
use imgdep::orchestrator::Orchestrator;
use imgdep::output::{create_formatter, OutputConfig};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // stdout carries the result; logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("imgdep={}", args.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), command = ?args.command, "starting");

    let output_config = OutputConfig::new(args.format, io::stdout().is_terminal());
    let orchestrator = Orchestrator::new(args);
    let outcome = orchestrator.run()?;

    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();
    formatter.format(&outcome, &mut stdout)?;
    stdout.flush()?;

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

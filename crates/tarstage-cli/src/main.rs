//! Tarstage CLI - buffered tar extraction and extraction benchmarks.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    if let Err(err) = init_logging(cli.verbose) {
        formatter.format_error("init", &err);
        return ExitCode::FAILURE;
    }

    let (operation, result) = match &cli.command {
        cli::Commands::Extract(args) => (
            "extract",
            commands::extract::execute(args, &*formatter, cli.quiet || cli.json),
        ),
        cli::Commands::Bench(args) => ("bench", commands::bench::execute(args, &*formatter)),
        cli::Commands::Completion { shell } => {
            commands::completion::execute(*shell);
            ("completion", Ok(()))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(operation, error = ?err, "command failed");
            formatter.format_error(operation, &err);
            ExitCode::FAILURE
        }
    }
}

/// Installs the stderr log subscriber when `--verbose` or `RUST_LOG` asks for it.
fn init_logging(verbose: bool) -> Result<()> {
    if !verbose && std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let level = if verbose { "tarstage=debug" } else { "tarstage=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

//! jobhook: webhook notifications for scheduled job executions
//!
//! Entry point for the jobhook application.

use std::path::Path;
use std::process::ExitCode;

use jobhook::config::{self, Cli, Command, RunArgs, write_default_config};

mod app;
mod run;

use app::{exit_code, job_status, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    setup_tracing(cli.verbose);

    let config_path = config::config_path_from_env(cli.webhook_config.as_deref());

    match cli.command {
        Command::Init { output } => handle_init(&output),
        Command::Check => handle_check(&config_path),
        Command::Run(args) => run_job(&config_path, args),
    }
}

/// Handles the `init` subcommand.
fn handle_init(output: &Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Webhook config template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Handles the `check` subcommand.
fn handle_check(path: &Path) -> ExitCode {
    match run::check(path) {
        Ok(report) => {
            print!("{report}");
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            exit_code::CONFIG_ERROR
        }
    }
}

/// Runs the job and exits with its status.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn run_job(path: &Path, args: RunArgs) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    let result = runtime.block_on(run::execute(path, args));
    ExitCode::from(job_status(&result))
}

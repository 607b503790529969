//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, and error hints
//! that support the main entry point.

use jobhook::config::ConfigError;
use jobhook::job::CommandError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - unreadable or invalid webhook config.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - the runtime or the shell could not start.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// The process status that reports a job's result.
///
/// A command that exits non-zero passes its own code through; one killed
/// by a signal (or with a code outside `1..=255`) maps to 1. A shell that
/// could not be started maps to the runtime error code.
pub fn job_status(result: &Result<(), CommandError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(CommandError::Exit(status)) => status
            .code()
            .and_then(|code| u8::try_from(code).ok())
            .filter(|code| *code != 0)
            .unwrap_or(1),
        Err(CommandError::Spawn(_)) => 2,
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    match error {
        ConfigError::JsonParse { .. } | ConfigError::Validation(_) => {
            eprintln!("\nRun 'jobhook init' to generate an example webhook config.");
        }
        ConfigError::FileRead { path, .. } => {
            eprintln!(
                "\nCheck that '{}' is readable, or point WEBHOOK_CONFIG at another file.",
                path.display()
            );
        }
        ConfigError::FileWrite { .. } => {}
    }
}

/// Sets up the tracing subscriber for logging.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

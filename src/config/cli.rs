//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::PerJobConfig;

/// jobhook: webhook notifications for job executions
///
/// Loads webhook definitions from a JSON file and delivers templated HTTP
/// requests when a job finishes.
#[derive(Debug, Parser)]
#[command(name = "jobhook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Path to the webhook config file (the WEBHOOK_CONFIG environment variable wins)
    #[arg(long = "webhook-config", short = 'c', global = true)]
    pub webhook_config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for jobhook
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an example webhook config file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "webhooks.json")]
        output: PathBuf,
    },

    /// Load and validate the webhook config, then list the definitions
    Check,

    /// Run a shell command as a job and notify its webhooks
    Run(RunArgs),
}

/// Arguments of the `run` subcommand.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Job name exposed to templates
    #[arg(long = "job-name", default_value = "job")]
    pub job_name: String,

    /// Schedule expression exposed to templates
    #[arg(long, default_value = "")]
    pub schedule: String,

    /// Webhooks to fire when the job fails (comma list or JSON array)
    #[arg(long = "webhook-error-names", default_value = "")]
    pub webhook_error_names: String,

    /// Webhooks to fire when the job succeeds (comma list or JSON array)
    #[arg(long = "webhook-info-names", default_value = "")]
    pub webhook_info_names: String,

    /// Seconds to wait for in-flight deliveries before exiting
    #[arg(long = "drain-timeout", default_value_t = 60)]
    pub drain_timeout: u64,

    /// Command line to execute with `sh -c`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    /// The per-job webhook references given on the command line.
    #[must_use]
    pub fn per_job(&self) -> PerJobConfig {
        PerJobConfig::new(
            self.webhook_error_names.clone(),
            self.webhook_info_names.clone(),
        )
    }

    /// The command words joined into one shell line.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }
}

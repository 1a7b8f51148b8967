//! SSH subcommand implementation.

use crate::config::Settings;
use crate::engine::RetryPolicy;
use crate::error::CliResult;
use crate::output::{self, ConsoleReporter, NullReporter, Reporter};
use crate::scanner::{read_candidates, CredentialConfig, CredentialTester};
use clap::{ArgGroup, Parser};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Try candidate passwords against an SSH server.
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("secret").required(true).args(["password", "file"])))]
pub struct SshCommand {
    /// Address of the SSH server
    #[arg(value_name = "TARGET")]
    pub target: IpAddr,

    /// Username to authenticate as
    #[arg(short, long)]
    pub username: String,

    /// A single password to try
    #[arg(short, long)]
    pub password: Option<String>,

    /// File with one password per line
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Seconds before an attempt gives up, fractional allowed
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// Concurrent attempts
    #[arg(long)]
    pub threads: Option<usize>,

    /// Retries for attempts that fail before authenticating (0 = none)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base delay between retries in milliseconds, doubled per retry
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Attempts per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,
}

impl SshCommand {
    /// Build the run configuration, flags taking precedence over settings.
    pub fn config(&self, settings: &Settings) -> CliResult<CredentialConfig> {
        let defaults = &settings.ssh;
        let candidates = match (&self.password, &self.file) {
            (Some(password), _) => vec![password.clone()],
            (None, Some(path)) => read_candidates(path)?,
            (None, None) => Vec::new(),
        };

        let base = Duration::from_millis(self.backoff_ms.unwrap_or(defaults.backoff_ms));
        let retry = RetryPolicy::new(self.max_retries.unwrap_or(defaults.max_retries))
            .with_backoff(base, RetryPolicy::DEFAULT_MAX_DELAY);

        let config = CredentialConfig::new(self.target, self.username.clone(), candidates)?
            .with_port(self.port.unwrap_or(defaults.port))
            .with_timeout_secs(self.timeout.unwrap_or(defaults.timeout_secs))?
            .with_workers(self.threads.unwrap_or(defaults.threads))
            .with_retry_policy(retry)
            .with_rate_limit(self.rate_limit.unwrap_or(defaults.rate_limit));
        Ok(config)
    }

    /// Execute the ssh command.
    pub async fn execute(&self, settings: &Settings, quiet: bool) -> CliResult<()> {
        let config = self.config(settings)?;
        let reporter: Arc<dyn Reporter> = if quiet {
            Arc::new(NullReporter)
        } else {
            Arc::new(ConsoleReporter::default())
        };

        let report = CredentialTester::new(config)
            .with_reporter(reporter)
            .run()
            .await?;
        output::print_credential_report(&report)?;
        Ok(())
    }
}

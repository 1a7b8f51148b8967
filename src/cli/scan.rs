//! Scan subcommand implementation.
//!
//! Handles the `prowl scan [target]` command for port scanning.

use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, ConsoleReporter, NullReporter, OutputFormat, Reporter};
use crate::resolve;
use crate::scanner::{PortScanner, ScanConfig};
use crate::store::Protocol;
use crate::types::TargetSpec;
use clap::Parser;
use std::sync::Arc;

/// Scan hosts for open ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan; defaults to the local /24 block
    ///
    /// Examples:
    ///   192.168.0.1                     Single IP address
    ///   192.168.0.0/24                  Hosts .1 through .254
    ///   [192.168.0.1,10.0.0.0/24]       Bracketed list
    #[arg(value_name = "TARGET", verbatim_doc_comment)]
    pub target: Option<String>,

    /// Ports to scan (e.g. "80", "80,443", "8010-8080", "22,80-90,8080")
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Maximum number of concurrent workers (at most 4095)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Seconds to wait for a connection, fractional allowed
    #[arg(short, long)]
    pub wait: Option<f64>,

    /// Probe over UDP instead of TCP
    #[arg(short, long)]
    pub udp: bool,

    /// Show refused connections
    #[arg(short = 'e', long)]
    pub show_refused: bool,

    /// Read and show service banners
    #[arg(short, long)]
    pub banner: bool,

    /// Skip reverse DNS for hosts with open ports
    #[arg(long)]
    pub no_resolve: bool,

    /// Probes per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Output format for the final report
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

impl ScanCommand {
    /// Build the scan configuration, flags taking precedence over settings.
    pub fn config(&self, settings: &Settings) -> CliResult<ScanConfig> {
        let defaults = &settings.scan;
        let target = match &self.target {
            Some(target) => target.clone(),
            None => TargetSpec::block_of(resolve::local_ipv4()).to_string(),
        };
        let ports = self.ports.as_deref().unwrap_or(&defaults.ports);
        let protocol = if self.udp { Protocol::Udp } else { Protocol::Tcp };

        let config = ScanConfig::parse(&target, Some(ports))?
            .with_wait_secs(self.wait.unwrap_or(defaults.wait_secs))?
            .with_protocol(protocol)
            .with_workers(self.threads.unwrap_or(defaults.threads))
            .with_show_refused(self.show_refused || defaults.show_refused)
            .with_banners(self.banner || defaults.banner)
            .with_hostname_resolution(!self.no_resolve && defaults.resolve)
            .with_rate_limit(self.rate_limit.unwrap_or(defaults.rate_limit));
        Ok(config)
    }

    /// Execute the scan command.
    pub async fn execute(&self, settings: &Settings, quiet: bool) -> CliResult<()> {
        let config = self.config(settings)?;
        let format = self.output.unwrap_or(settings.scan.output);
        let plain = format == OutputFormat::Plain;

        if plain && !quiet {
            output::print_info(&format!("scanning: {}", config.targets));
        }
        if config.protocol == Protocol::Udp && !quiet {
            output::print_warning(
                "UDP connect succeeds for any routable address; open ports are unconfirmed",
            );
        }

        let show_refused = config.show_refused;
        let reporter: Arc<dyn Reporter> = if plain && !quiet {
            Arc::new(ConsoleReporter::new(show_refused, config.grab_banners))
        } else {
            Arc::new(NullReporter)
        };

        let report = PortScanner::new(config).with_reporter(reporter).run().await?;

        match format {
            OutputFormat::Plain => output::print_scan_report(&report, show_refused)?,
            OutputFormat::Json => output::print_scan_json(&report)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CliError, ConfigError, SpecError};

    fn parse(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["scan"];
        argv.extend_from_slice(args);
        ScanCommand::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_settings_fill_missing_flags() {
        let mut settings = Settings::default();
        settings.scan.threads = 42;
        settings.scan.wait_secs = 1.5;

        let config = parse(&["10.0.0.1"]).config(&settings).unwrap();
        assert_eq!(config.workers, 42);
        assert_eq!(config.wait().as_millis(), 1500);
        assert_eq!(config.ports.to_string(), "22,23,80,443");
        assert_eq!(config.protocol, Protocol::Tcp);
        assert!(config.resolve_hostnames);
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        settings.scan.threads = 42;

        let config = parse(&["10.0.0.1", "-t", "7", "-p", "8080", "-u", "--no-resolve"])
            .config(&settings)
            .unwrap();
        assert_eq!(config.workers, 7);
        assert_eq!(config.ports.to_string(), "8080");
        assert_eq!(config.protocol, Protocol::Udp);
        assert!(!config.resolve_hostnames);
    }

    #[test]
    fn test_default_target_is_local_block() {
        let config = parse(&[]).config(&Settings::default()).unwrap();
        assert!(matches!(config.targets, TargetSpec::Block(_)));
    }

    #[test]
    fn test_invalid_input_is_reported() {
        let settings = Settings::default();
        assert!(matches!(
            parse(&["10.0.0.1", "-p", "&"]).config(&settings),
            Err(CliError::Spec(SpecError::InvalidPort(_)))
        ));
        assert!(matches!(
            parse(&["10.0.0.1", "-w", "0"]).config(&settings),
            Err(CliError::Config(ConfigError::InvalidWaitTime(_)))
        ));
        assert!(matches!(
            parse(&["256.256.256.256"]).config(&settings),
            Err(CliError::Spec(_))
        ));
    }
}

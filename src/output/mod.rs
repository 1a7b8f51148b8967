//! Console output: live progress lines and final reports.

mod json_format;
mod plain;

pub use json_format::print_scan_json;
pub use plain::{
    print_credential_report, print_error, print_info, print_scan_report, print_warning,
    write_credential_report, write_scan_report,
};

use crate::probe::is_suppressed;
use crate::store::{Host, Port};
use crate::types::CredentialRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Receives results as they are recorded. Calls happen under the result
/// store's lock, so implementations must be quick and must not block.
pub trait Reporter: Send + Sync {
    fn port_recorded(&self, _host: &Host, _port: &Port) {}

    fn credential_found(&self, _record: &CredentialRecord) {}
}

/// Reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Prints live lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub show_refused: bool,
    pub show_banners: bool,
}

impl ConsoleReporter {
    pub fn new(show_refused: bool, show_banners: bool) -> Self {
        Self {
            show_refused,
            show_banners,
        }
    }

    /// The live line for a recorded port, if it should be shown.
    pub fn port_line(&self, host: &Host, port: &Port) -> Option<String> {
        if port.is_open() {
            match port.detail.as_deref() {
                Some(banner) if self.show_banners => {
                    Some(format!("   {}:{} OPEN: {}", host.address, port.number, banner))
                }
                _ => Some(format!("   {}:{} OPEN", host.address, port.number)),
            }
        } else if self.show_refused && !is_suppressed(port.status_code) {
            Some(format!("   {}:{} CLOSED", host.address, port.number))
        } else {
            None
        }
    }
}

impl Reporter for ConsoleReporter {
    fn port_recorded(&self, host: &Host, port: &Port) {
        if let Some(line) = self.port_line(host, port) {
            println!("{}", line);
        }
    }

    fn credential_found(&self, record: &CredentialRecord) {
        println!("[+] {} is correct.", record);
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOutcome;
    use crate::store::Protocol;
    use crate::types::PortNumber;

    fn host() -> Host {
        Host::new("192.168.0.7".parse().unwrap())
    }

    fn port(outcome: ProbeOutcome) -> Port {
        Port::from_outcome(PortNumber::new(22).unwrap(), Protocol::Tcp, &outcome)
    }

    #[test]
    fn test_open_lines() {
        let reporter = ConsoleReporter::new(false, true);
        let open = port(ProbeOutcome::open().with_detail(Some("SSH-2.0".into())));
        assert_eq!(
            reporter.port_line(&host(), &open).as_deref(),
            Some("   192.168.0.7:22 OPEN: SSH-2.0")
        );

        let quiet_banner = ConsoleReporter::new(false, false);
        assert_eq!(
            quiet_banner.port_line(&host(), &open).as_deref(),
            Some("   192.168.0.7:22 OPEN")
        );
    }

    #[test]
    fn test_closed_lines_need_show_refused() {
        let refused = port(ProbeOutcome::closed(libc::ECONNREFUSED));
        assert_eq!(ConsoleReporter::new(false, false).port_line(&host(), &refused), None);
        assert_eq!(
            ConsoleReporter::new(true, false)
                .port_line(&host(), &refused)
                .as_deref(),
            Some("   192.168.0.7:22 CLOSED")
        );
    }

    #[test]
    fn test_noisy_codes_suppressed() {
        let reporter = ConsoleReporter::new(true, false);
        for code in [libc::EAGAIN, libc::EHOSTDOWN, libc::EHOSTUNREACH, libc::ETIMEDOUT] {
            assert_eq!(reporter.port_line(&host(), &port(ProbeOutcome::closed(code))), None);
        }
    }
}

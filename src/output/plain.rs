//! Plain text reports.

use crate::scanner::{CredentialReport, ScanReport};
use crate::store::PortStatus;
use console::style;
use std::io::{self, Write};

/// Print the final scan report to stdout.
pub fn print_scan_report(report: &ScanReport, show_refused: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_scan_report(&mut out, report, show_refused)
}

/// Write the final scan report: ports per host in address order, the
/// summary count and any resolved hostnames.
pub fn write_scan_report<W: Write>(
    out: &mut W,
    report: &ScanReport,
    show_refused: bool,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Scanned {} ports in {:.2}s",
        style(report.ports_scanned).bold(),
        report.stats.elapsed.as_secs_f64()
    )?;
    writeln!(out)?;

    for host in &report.hosts {
        for port in &host.ports {
            match (port.status, port.detail.as_deref()) {
                (PortStatus::Open, Some(detail)) => writeln!(
                    out,
                    "{} {}:{} is {}: {}",
                    style("[+]").green().bold(),
                    host.address,
                    port.number,
                    port.status,
                    detail
                )?,
                (PortStatus::Open, None) => writeln!(
                    out,
                    "{} {}:{} is {}",
                    style("[+]").green().bold(),
                    host.address,
                    port.number,
                    port.status
                )?,
                (PortStatus::Closed, _) if show_refused && port.status_code == libc::ECONNREFUSED => {
                    writeln!(
                        out,
                        "{} {}:{} is {}: {}",
                        style("[-]").red(),
                        host.address,
                        port.number,
                        port.status,
                        strerror(port.status_code)
                    )?
                }
                (PortStatus::Closed, _) => {}
            }
        }
    }

    if !report.resolved.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", style("Resolved hosts:").bold())?;
        for resolved in &report.resolved {
            writeln!(
                out,
                "   {} {} resolves to {}",
                style("[+]").green(),
                resolved.address,
                style(&resolved.hostname).cyan()
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "End")?;
    Ok(())
}

/// Print the credential run summary to stdout.
pub fn print_credential_report(report: &CredentialReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_credential_report(&mut out, report)
}

pub fn write_credential_report<W: Write>(out: &mut W, report: &CredentialReport) -> io::Result<()> {
    let summary = &report.summary;
    writeln!(out)?;
    writeln!(out, "Attempted {} connections", style(report.attempts).bold())?;
    writeln!(
        out,
        "  {} found, {} rejected, {} retried, {} abandoned",
        style(summary.found.len()).green().bold(),
        summary.rejected,
        report.retried,
        style(summary.abandoned).yellow()
    )?;
    for record in &summary.found {
        writeln!(out, "{} {} is correct.", style("[+]").green().bold(), record)?;
    }
    Ok(())
}

/// Message text for an OS error code.
fn strerror(code: i32) -> String {
    let text = io::Error::from_raw_os_error(code).to_string();
    match text.split_once(" (os error") {
        Some((message, _)) => message.to_string(),
        None => text,
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("[+]").blue().bold(), msg);
}

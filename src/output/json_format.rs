//! JSON output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Print the scan report as pretty JSON.
pub fn print_scan_json(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_scan_json(&mut out, report)
}

pub(crate) fn write_scan_json<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).map_err(io::Error::other)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunStats;
    use crate::probe::ProbeOutcome;
    use crate::store::{Host, Port, Protocol};
    use crate::types::PortNumber;
    use chrono::Utc;

    #[test]
    fn test_json_shape() {
        let mut host = Host::new("10.0.0.1".parse().unwrap());
        host.ports.push(Port::from_outcome(
            PortNumber::new(22).unwrap(),
            Protocol::Tcp,
            &ProbeOutcome::open(),
        ));
        let report = ScanReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            protocol: Protocol::Tcp,
            ports_scanned: 1,
            open_ports: 1,
            hosts: vec![host],
            resolved: Vec::new(),
            stats: RunStats::default(),
        };

        let mut out = Vec::new();
        write_scan_json(&mut out, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["protocol"], "tcp");
        assert_eq!(value["ports_scanned"], 1);
        assert_eq!(value["hosts"][0]["address"], "10.0.0.1");
        assert_eq!(value["hosts"][0]["ports"][0]["number"], 22);
        assert_eq!(value["hosts"][0]["ports"][0]["status"], "open");
        assert!(value.get("resolved").is_none());
        assert!(value["started_at"].is_string());
    }
}

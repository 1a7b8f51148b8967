//! Port number types with validation and parsing.
//!
//! The `PortNumber` newtype ensures values are always valid port numbers
//! (1-65535). `PortRange` and `PortSpec` handle complex port specifications.

use crate::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNumber(u16);

impl PortNumber {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new port number, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    fn parse_part(text: &str) -> Result<Self, SpecError> {
        let value: u32 = text
            .trim()
            .parse()
            .map_err(|_| SpecError::InvalidPort(text.to_string()))?;
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(SpecError::PortOutOfRange(value))
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for PortNumber {
    type Error = SpecError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(SpecError::PortOutOfRange(u32::from(value)))
    }
}

impl From<PortNumber> for u16 {
    fn from(port: PortNumber) -> Self {
        port.0
    }
}

/// An inclusive range of ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: PortNumber,
    end: PortNumber,
}

impl PortRange {
    /// Create a new port range.
    pub fn new(start: PortNumber, end: PortNumber) -> Result<Self, SpecError> {
        if start > end {
            Err(SpecError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    /// Create a range containing a single port.
    pub const fn single(port: PortNumber) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in this range, ascending.
    pub fn iter(&self) -> impl Iterator<Item = PortNumber> {
        (self.start.0..=self.end.0).map(PortNumber)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A port specification made of single ports and ranges.
///
/// Supports formats like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1000"
/// - Mixed: "22,80-90,8080"
///
/// Ports are produced in the literal order they were written, duplicates
/// included; the scan order follows the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    /// Ports scanned when none are given.
    pub const DEFAULT_PORTS: [u16; 4] = [22, 23, 80, 443];

    /// Create an empty port specification.
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// The default specification, `22,23,80,443`.
    pub fn default_ports() -> Self {
        let mut spec = Self::new();
        for port in Self::DEFAULT_PORTS.iter().copied().filter_map(PortNumber::new) {
            spec.add_port(port);
        }
        spec
    }

    /// Add a port range to the specification.
    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    /// Add a single port to the specification.
    pub fn add_port(&mut self, port: PortNumber) {
        self.ranges.push(PortRange::single(port));
    }

    /// All ports in literal order.
    pub fn to_ports(&self) -> Vec<PortNumber> {
        self.ranges.iter().flat_map(PortRange::iter).collect()
    }

    /// Total number of ports, duplicates counted.
    pub fn count(&self) -> usize {
        self.ranges.iter().map(PortRange::len).sum()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromStr for PortSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SpecError::EmptyPorts);
        }

        let mut spec = Self::new();

        for part in s.split(',') {
            let part = part.trim();
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = PortNumber::parse_part(start)
                        .map_err(|e| with_context(e, part))?;
                    let end = PortNumber::parse_part(end).map_err(|e| with_context(e, part))?;
                    spec.add_range(PortRange::new(start, end)?);
                }
                None => spec.add_port(PortNumber::parse_part(part)?),
            }
        }

        Ok(spec)
    }
}

// Report the whole range item rather than one of its halves.
fn with_context(err: SpecError, part: &str) -> SpecError {
    match err {
        SpecError::InvalidPort(_) => SpecError::InvalidPort(part.to_string()),
        other => other,
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(spec: &str) -> Vec<u16> {
        spec.parse::<PortSpec>()
            .unwrap()
            .to_ports()
            .into_iter()
            .map(u16::from)
            .collect()
    }

    #[test]
    fn test_port_validation() {
        assert!(PortNumber::new(0).is_none());
        assert!(PortNumber::new(1).is_some());
        assert!(PortNumber::new(65535).is_some());
    }

    #[test]
    fn test_single_and_list() {
        assert_eq!(numbers("80"), vec![80]);
        assert_eq!(numbers("80,443"), vec![80, 443]);
    }

    #[test]
    fn test_range_keeps_literal_order() {
        assert_eq!(numbers("80-82,443"), vec![80, 81, 82, 443]);
        assert_eq!(
            numbers("80-82,443,8080-8081,9090"),
            vec![80, 81, 82, 443, 8080, 8081, 9090]
        );
        assert_eq!(numbers("443,22"), vec![443, 22]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let spec: PortSpec = "80,80".parse().unwrap();
        assert_eq!(spec.count(), 2);
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(numbers(" 22 , 80 - 81 "), vec![22, 80, 81]);
    }

    #[test]
    fn test_bad_ports() {
        assert_eq!(
            "&".parse::<PortSpec>(),
            Err(SpecError::InvalidPort("&".to_string()))
        );
        assert_eq!("".parse::<PortSpec>(), Err(SpecError::EmptyPorts));
        assert_eq!("0".parse::<PortSpec>(), Err(SpecError::PortOutOfRange(0)));
        assert_eq!(
            "70000".parse::<PortSpec>(),
            Err(SpecError::PortOutOfRange(70000))
        );
        assert_eq!(
            "8080-8010".parse::<PortSpec>(),
            Err(SpecError::InvalidRange(8080, 8010))
        );
        assert!("1-2-3".parse::<PortSpec>().is_err());
        assert!("80,".parse::<PortSpec>().is_err());
    }

    #[test]
    fn test_default_ports() {
        let spec = PortSpec::default_ports();
        assert_eq!(spec.to_string(), "22,23,80,443");
    }
}

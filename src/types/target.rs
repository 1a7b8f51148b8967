//! Target specification parsing.
//!
//! Supports:
//! - Single IPv4 address: "192.168.0.1"
//! - A /24 block: "192.168.0.0/24", expanded to hosts .1 through .254
//! - A bracketed list of either: "[192.168.0.1,10.0.0.0/24]"

use super::PortNumber;
use crate::error::{SpecError, SpecResult};
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tracing::warn;

/// One host/port pair to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    pub address: IpAddr,
    pub port: PortNumber,
}

impl ScanTarget {
    /// Create a new scan target.
    pub const fn new(address: IpAddr, port: PortNumber) -> Self {
        Self { address, port }
    }

    /// The socket address to connect to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port.as_u16())
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A parsed target specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IPv4 address.
    Single(Ipv4Addr),
    /// A /24 network block.
    Block(Ipv4Network),
    /// A bracketed list of singles and blocks, invalid elements dropped.
    List(Vec<TargetSpec>),
}

impl TargetSpec {
    /// The only block size accepted.
    pub const BLOCK_PREFIX: u8 = 24;

    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> SpecResult<Self> {
        let s = s.trim();

        if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let elements: Vec<TargetSpec> = inner
                .split(',')
                .map(str::trim)
                .filter_map(|element| match Self::parse_element(element) {
                    Ok(spec) => Some(spec),
                    Err(e) => {
                        warn!(element, error = %e, "skipping invalid target");
                        None
                    }
                })
                .collect();

            if elements.is_empty() {
                return Err(SpecError::EmptyTargetList(s.to_string()));
            }
            return Ok(Self::List(elements));
        }

        Self::parse_element(s)
    }

    fn parse_element(s: &str) -> SpecResult<Self> {
        if s.contains('/') {
            return parse_block(s).map(Self::Block);
        }

        if !looks_like_ipv4(s) {
            return Err(SpecError::InvalidAddress(s.to_string()));
        }
        s.parse::<Ipv4Addr>()
            .map(Self::Single)
            .map_err(|_| SpecError::InvalidAddress(s.to_string()))
    }

    /// All addresses in scan order.
    pub fn addresses(&self) -> Vec<IpAddr> {
        match self {
            Self::Single(ip) => vec![IpAddr::V4(*ip)],
            Self::Block(network) => {
                let [a, b, c, _] = network.network().octets();
                (1..=254)
                    .map(|host| IpAddr::V4(Ipv4Addr::new(a, b, c, host)))
                    .collect()
            }
            Self::List(elements) => elements.iter().flat_map(Self::addresses).collect(),
        }
    }

    /// The /24 block containing `ip`, used as the default scan target.
    pub fn block_of(ip: Ipv4Addr) -> Self {
        let [a, b, c, _] = ip.octets();
        // A /24 prefix is always valid.
        match Ipv4Network::new(Ipv4Addr::new(a, b, c, 0), Self::BLOCK_PREFIX) {
            Ok(network) => Self::Block(network),
            Err(_) => Self::Single(ip),
        }
    }
}

fn parse_block(s: &str) -> SpecResult<Ipv4Network> {
    let network: Ipv4Network = s.parse().map_err(|_| SpecError::InvalidCidr(s.to_string()))?;
    if network.prefix() != TargetSpec::BLOCK_PREFIX || network.ip() != network.network() {
        return Err(SpecError::InvalidCidr(s.to_string()));
    }
    Ok(network)
}

// Dotted quad of 1-3 digit groups; rejects hostnames and bare integers.
fn looks_like_ipv4(s: &str) -> bool {
    let groups: Vec<&str> = s.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()))
}

impl FromStr for TargetSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Block(network) => write!(f, "{}", network),
            Self::List(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", parts.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(spec: &str) -> Vec<String> {
        TargetSpec::parse(spec)
            .unwrap()
            .addresses()
            .iter()
            .map(|ip| ip.to_string())
            .collect()
    }

    #[test]
    fn test_single_ip() {
        assert_eq!(addrs("1.1.1.1"), vec!["1.1.1.1"]);
    }

    #[test]
    fn test_block_expands_to_hosts() {
        let hosts = addrs("127.0.0.0/24");
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.first().map(String::as_str), Some("127.0.0.1"));
        assert_eq!(hosts.last().map(String::as_str), Some("127.0.0.254"));
        let expected: Vec<String> = (1..=254).map(|h| format!("127.0.0.{}", h)).collect();
        assert_eq!(hosts, expected);
    }

    #[test]
    fn test_list_keeps_order() {
        assert_eq!(addrs("[1.1.1.1,1.1.1.2]"), vec!["1.1.1.1", "1.1.1.2"]);
        assert_eq!(addrs("[10.1.1.20, 1.1.1.2]"), vec!["10.1.1.20", "1.1.1.2"]);
    }

    #[test]
    fn test_list_skips_invalid_elements() {
        assert_eq!(addrs("[1.1.1.1,bad]"), vec!["1.1.1.1"]);
        assert!(matches!(
            TargetSpec::parse("[bad,worse]"),
            Err(SpecError::EmptyTargetList(_))
        ));
    }

    #[test]
    fn test_bad_addresses() {
        for bad in ["256.256.256.256", "1.2.3", "bad", "12345", ""] {
            assert!(
                matches!(TargetSpec::parse(bad), Err(SpecError::InvalidAddress(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_bad_blocks() {
        for bad in ["256.256.256.0/24", "10.0.0.0/16", "10.0.0.5/24"] {
            assert!(
                matches!(TargetSpec::parse(bad), Err(SpecError::InvalidCidr(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_block_of_local_address() {
        let spec = TargetSpec::block_of(Ipv4Addr::new(192, 168, 0, 12));
        assert_eq!(spec.to_string(), "192.168.0.0/24");
    }
}

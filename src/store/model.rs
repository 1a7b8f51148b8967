//! Scan result data model: hosts and the ports recorded against them.

use crate::probe::{OutcomeKind, ProbeOutcome};
use crate::types::PortNumber;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Transport used for a port probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Default for Protocol {
    fn default() -> Self {
        Self::Tcp
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// Status of a scanned port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// Connect returned 0.
    Open,
    /// Any other connect result.
    Closed,
}

impl From<OutcomeKind> for PortStatus {
    fn from(kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::Open => Self::Open,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// A port observed on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: PortNumber,
    pub protocol: Protocol,
    pub status: PortStatus,
    /// Raw OS status code of the connect attempt.
    pub status_code: i32,
    /// Banner captured from the service, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Port {
    /// Build a port record from a connect outcome.
    pub fn from_outcome(number: PortNumber, protocol: Protocol, outcome: &ProbeOutcome) -> Self {
        Self {
            number,
            protocol,
            status: outcome.kind.into(),
            status_code: outcome.code,
            detail: outcome.detail.clone(),
        }
    }

    /// Ports are unique per host on this key.
    pub fn key(&self) -> (PortNumber, Protocol) {
        (self.number, self.protocol)
    }

    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

/// A scanned address and its ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub address: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub ports: Vec<Port>,
}

impl Host {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            hostname: None,
            ports: Vec::new(),
        }
    }

    pub fn has_port(&self, number: PortNumber, protocol: Protocol) -> bool {
        self.ports.iter().any(|p| p.key() == (number, protocol))
    }

    pub fn port(&self, number: PortNumber, protocol: Protocol) -> Option<&Port> {
        self.ports.iter().find(|p| p.key() == (number, protocol))
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_open())
    }

    pub fn has_open_ports(&self) -> bool {
        self.open_ports().next().is_some()
    }
}

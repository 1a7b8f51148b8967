//! Probe abstraction.
//!
//! A probe performs one network interaction against one target and returns a
//! classified [`ProbeOutcome`]. Connect probes classify port reachability,
//! credential probes classify secrets. The engine only sees the trait.

mod connect;
mod credential;
mod ssh;
mod tcp;
mod udp;

pub use connect::{
    error_code, is_suppressed, ConnectAttempt, ConnectProbe, Connection, Connector,
    SUPPRESSED_CODES,
};
pub use credential::{AuthAttempt, Authenticator, CredentialProbe};
pub use ssh::SshAuthenticator;
pub use tcp::TcpConnector;
pub use udp::UdpConnector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// Connection established.
    Open,
    /// Connection refused, timed out or otherwise failed.
    Closed,
    /// The candidate secret is correct.
    Authenticated,
    /// The candidate secret is provably wrong.
    Rejected,
    /// Transport or protocol failure that proves nothing about the secret.
    Errored,
}

impl OutcomeKind {
    /// Transient outcomes go back to the retry policy instead of a sink.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Errored)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Rejected => write!(f, "rejected"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Result of executing a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub kind: OutcomeKind,
    /// Raw OS or protocol status code, 0 on success.
    pub code: i32,
    /// Banner text or error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeOutcome {
    pub fn new(kind: OutcomeKind, code: i32) -> Self {
        Self {
            kind,
            code,
            detail: None,
        }
    }

    pub fn open() -> Self {
        Self::new(OutcomeKind::Open, 0)
    }

    pub fn closed(code: i32) -> Self {
        Self::new(OutcomeKind::Closed, code)
    }

    pub fn authenticated() -> Self {
        Self::new(OutcomeKind::Authenticated, 0)
    }

    pub fn rejected(code: i32) -> Self {
        Self::new(OutcomeKind::Rejected, code)
    }

    pub fn errored(code: i32, detail: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Errored, code).with_detail(Some(detail.into()))
    }

    /// Attach a banner or message.
    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Trait for probe implementations.
///
/// Implementations must never panic or return errors for network failures;
/// every failure is folded into the outcome.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// The unit of work this probe classifies.
    type Target: Clone + fmt::Debug + Send + Sync + 'static;

    /// Execute one probe against `target`.
    async fn probe(&self, target: &Self::Target) -> ProbeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_errored_is_transient() {
        assert!(OutcomeKind::Errored.is_transient());
        assert!(!OutcomeKind::Closed.is_transient());
        assert!(!OutcomeKind::Rejected.is_transient());
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = ProbeOutcome::open().with_detail(Some("SSH-2.0".to_string()));
        assert_eq!(outcome.kind, OutcomeKind::Open);
        assert_eq!(outcome.code, 0);
        assert_eq!(outcome.detail.as_deref(), Some("SSH-2.0"));

        let outcome = ProbeOutcome::errored(-43, "reset");
        assert!(outcome.is_transient());
        assert_eq!(outcome.detail.as_deref(), Some("reset"));
    }
}

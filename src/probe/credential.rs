//! Credential probing against a fixed host.

use super::{Probe, ProbeOutcome};
use crate::types::Credential;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result of one authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAttempt {
    /// The server accepted the secret.
    Accepted,
    /// The server refused the secret at the protocol level.
    Denied { code: i32 },
    /// The attempt never got far enough to judge the secret.
    Failed { code: i32, reason: String },
}

impl From<AuthAttempt> for ProbeOutcome {
    fn from(attempt: AuthAttempt) -> Self {
        match attempt {
            AuthAttempt::Accepted => ProbeOutcome::authenticated(),
            AuthAttempt::Denied { code } => ProbeOutcome::rejected(code),
            AuthAttempt::Failed { code, reason } => ProbeOutcome::errored(code, reason),
        }
    }
}

/// Performs one password authentication.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn authenticate(
        &self,
        host: SocketAddr,
        credential: &Credential,
        timeout: Duration,
    ) -> AuthAttempt;

    /// How long one attempt may run before it is cut off, given the
    /// per-step `timeout`. `None` when the authenticator bounds itself.
    fn deadline(&self, timeout: Duration) -> Option<Duration> {
        Some(timeout.saturating_mul(2))
    }
}

/// Classifies candidate secrets for one host.
#[derive(Clone)]
pub struct CredentialProbe {
    authenticator: Arc<dyn Authenticator>,
    host: SocketAddr,
    timeout: Duration,
}

impl CredentialProbe {
    pub fn new(authenticator: Arc<dyn Authenticator>, host: SocketAddr, timeout: Duration) -> Self {
        Self {
            authenticator,
            host,
            timeout,
        }
    }

    pub fn host(&self) -> SocketAddr {
        self.host
    }
}

#[async_trait]
impl Probe for CredentialProbe {
    type Target = Credential;

    async fn probe(&self, credential: &Credential) -> ProbeOutcome {
        debug!(
            "trying {}@{} / {}",
            credential.username,
            self.host.ip(),
            credential.secret
        );
        let attempt = self
            .authenticator
            .authenticate(self.host, credential, self.timeout);
        let attempt = match self.authenticator.deadline(self.timeout) {
            Some(deadline) => match tokio::time::timeout(deadline, attempt).await {
                Ok(attempt) => attempt,
                Err(_) => {
                    return ProbeOutcome::errored(libc::ETIMEDOUT, "authentication timed out")
                }
            },
            None => attempt.await,
        };
        attempt.into()
    }
}

//! Credential candidates and successful credential records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// One username / candidate secret pair to try.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub secret: String,
}

impl Credential {
    /// Create a new credential candidate.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

// Secrets stay out of debug logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A credential proven valid against a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub host: SocketAddr,
    pub username: String,
    pub secret: String,
}

impl CredentialRecord {
    /// Record a successful credential for `host`.
    pub fn new(host: SocketAddr, credential: &Credential) -> Self {
        Self {
            host,
            username: credential.username.clone(),
            secret: credential.secret.clone(),
        }
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} / {}", self.username, self.host.ip(), self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secret() {
        let credential = Credential::new("root", "hunter2");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("root"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_record_display() {
        let host: SocketAddr = "10.0.0.1:22".parse().unwrap();
        let record = CredentialRecord::new(host, &Credential::new("admin", "pw"));
        assert_eq!(record.to_string(), "admin@10.0.0.1 / pw");
    }
}

//! Aggregation of credential test results.

use crate::types::{Credential, CredentialRecord};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Successful credentials plus counters for everything else.
///
/// Rejected candidates are only counted; abandoned candidates (transient
/// failures that ran out of retries) are kept so they can be reported.
#[derive(Debug)]
pub struct CredentialLedger {
    host: SocketAddr,
    found: Mutex<Vec<CredentialRecord>>,
    abandoned: Mutex<Vec<Credential>>,
    rejected: AtomicUsize,
}

impl CredentialLedger {
    pub fn new(host: SocketAddr) -> Self {
        Self {
            host,
            found: Mutex::new(Vec::new()),
            abandoned: Mutex::new(Vec::new()),
            rejected: AtomicUsize::new(0),
        }
    }

    pub fn host(&self) -> SocketAddr {
        self.host
    }

    fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a credential that authenticated. `on_insert` runs under the lock.
    pub fn record_success<F>(&self, credential: &Credential, on_insert: F)
    where
        F: FnOnce(&CredentialRecord),
    {
        let mut found = Self::guard(&self.found);
        found.push(CredentialRecord::new(self.host, credential));
        if let Some(record) = found.last() {
            on_insert(record);
        }
    }

    pub fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self, credential: &Credential) {
        Self::guard(&self.abandoned).push(credential.clone());
    }

    pub fn found(&self) -> Vec<CredentialRecord> {
        Self::guard(&self.found).clone()
    }

    pub fn abandoned(&self) -> Vec<Credential> {
        Self::guard(&self.abandoned).clone()
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            host: self.host,
            found: self.found(),
            rejected: self.rejected(),
            abandoned: self.abandoned().len(),
        }
    }
}

/// Snapshot of a ledger for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialSummary {
    pub host: SocketAddr,
    pub found: Vec<CredentialRecord>,
    pub rejected: usize,
    pub abandoned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_counts() {
        let ledger = CredentialLedger::new("127.0.0.1:22".parse().unwrap());
        ledger.record_rejection();
        ledger.record_rejection();
        let mut seen = None;
        ledger.record_success(&Credential::new("user", "good"), |r| seen = Some(r.clone()));
        ledger.record_abandoned(&Credential::new("user", "flaky"));

        let summary = ledger.summary();
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.abandoned, 1);
        assert_eq!(summary.found.len(), 1);
        assert_eq!(seen.map(|r| r.secret), Some("good".to_string()));
    }
}

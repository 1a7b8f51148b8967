//! Lazy, single-pass target enumeration.

use crate::types::{Credential, PortNumber, ScanTarget};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// A finite, non-restartable sequence of targets in a fixed order.
///
/// Once `next` has returned `None` the stream stays exhausted, which the
/// producer uses as its stop signal.
pub struct TargetStream<T> {
    inner: Box<dyn Iterator<Item = T> + Send>,
    produced: usize,
    exhausted: bool,
}

impl<T> TargetStream<T> {
    /// Wrap any sendable iterator.
    pub fn new<I>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(targets.into_iter()),
            produced: 0,
            exhausted: false,
        }
    }

    /// Whether the stream has run dry.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of targets produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }
}

impl TargetStream<ScanTarget> {
    /// Host-major, port-minor product, both in the order given.
    pub fn scan(hosts: Vec<IpAddr>, ports: Vec<PortNumber>) -> Self {
        let ports: Arc<[PortNumber]> = ports.into();
        Self::new(hosts.into_iter().flat_map(move |address| {
            let ports = Arc::clone(&ports);
            (0..ports.len()).map(move |i| ScanTarget::new(address, ports[i]))
        }))
    }
}

impl TargetStream<Credential> {
    /// Every candidate secret for one username, in order.
    pub fn credentials(username: impl Into<String>, secrets: Vec<String>) -> Self {
        let username = username.into();
        Self::new(
            secrets
                .into_iter()
                .map(move |secret| Credential::new(username.clone(), secret)),
        )
    }
}

impl<T> Iterator for TargetStream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.exhausted {
            return None;
        }
        match self.inner.next() {
            Some(target) => {
                self.produced += 1;
                Some(target)
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else {
            self.inner.size_hint()
        }
    }
}

impl<T> fmt::Debug for TargetStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetStream")
            .field("produced", &self.produced)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

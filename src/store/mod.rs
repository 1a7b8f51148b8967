//! Thread-safe aggregation of probe results.
//!
//! Every mutation goes through one coarse lock.

mod credentials;
mod model;

pub use credentials::{CredentialLedger, CredentialSummary};
pub use model::{Host, Port, PortStatus, Protocol};

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    hosts: Vec<Host>,
    index: HashMap<IpAddr, usize>,
}

impl Inner {
    fn host_mut(&mut self, address: IpAddr) -> &mut Host {
        let next = self.hosts.len();
        let idx = *self.index.entry(address).or_insert(next);
        if idx == next {
            self.hosts.push(Host::new(address));
        }
        &mut self.hosts[idx]
    }
}

/// Mapping of address to host, shared by all workers.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: Mutex<Inner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Recover from a reporter that panicked while holding the lock.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a host if the address is unseen. Returns true when created.
    pub fn add_host(&self, address: IpAddr) -> bool {
        let mut inner = self.lock();
        let before = inner.hosts.len();
        inner.host_mut(address);
        inner.hosts.len() > before
    }

    /// Record `port` against `address`, creating the host on demand.
    ///
    /// `on_insert` runs under the store lock when the port is new, so output
    /// produced there never interleaves with other workers. A port whose
    /// (number, protocol) key already exists is left untouched and false is
    /// returned.
    pub fn record_port<F>(&self, address: IpAddr, port: Port, on_insert: F) -> bool
    where
        F: FnOnce(&Host, &Port),
    {
        let mut inner = self.lock();
        let host = inner.host_mut(address);
        if host.has_port(port.number, port.protocol) {
            debug!(%address, port = %port.number, protocol = %port.protocol, "port already recorded");
            return false;
        }
        host.ports.push(port);
        let host: &Host = host;
        if let Some(port) = host.ports.last() {
            on_insert(host, port);
        }
        true
    }

    /// Set the resolved hostname of a known host.
    pub fn set_hostname(&self, address: IpAddr, hostname: String) {
        let mut inner = self.lock();
        if let Some(&idx) = inner.index.get(&address) {
            inner.hosts[idx].hostname = Some(hostname);
        }
    }

    pub fn host(&self, address: IpAddr) -> Option<Host> {
        let inner = self.lock();
        inner.index.get(&address).map(|&idx| inner.hosts[idx].clone())
    }

    pub fn len(&self) -> usize {
        self.lock().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of ports marked open across all hosts.
    pub fn open_port_count(&self) -> usize {
        self.lock().hosts.iter().map(|h| h.open_ports().count()).sum()
    }

    /// Addresses with at least one open port, in insertion order.
    pub fn addresses_with_open_ports(&self) -> Vec<IpAddr> {
        self.lock()
            .hosts
            .iter()
            .filter(|h| h.has_open_ports())
            .map(|h| h.address)
            .collect()
    }

    /// Snapshot of all hosts in insertion order.
    pub fn hosts(&self) -> Vec<Host> {
        self.lock().hosts.clone()
    }

    /// Snapshot sorted by numeric address, each host's ports by key.
    pub fn ordered_hosts(&self) -> Vec<Host> {
        let mut hosts = self.hosts();
        hosts.sort_by_key(|h| h.address);
        for host in &mut hosts {
            host.ports.sort_by_key(Port::key);
        }
        hosts
    }
}

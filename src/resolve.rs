//! Reverse DNS and local address discovery.

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;
use tracing::{debug, warn};

/// Maps an address to a hostname.
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    /// The hostname for `address`, or its literal form when it has none.
    async fn resolve(&self, address: IpAddr) -> String;
}

/// PTR lookups through the system resolver.
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Use the system configuration, falling back to public defaults.
    pub fn from_system() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "system resolver unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

#[async_trait]
impl HostnameResolver for DnsResolver {
    async fn resolve(&self, address: IpAddr) -> String {
        match self.resolver.reverse_lookup(address).await {
            Ok(names) => names
                .iter()
                .next()
                .map(|name| name.to_string().trim_end_matches('.').to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| address.to_string()),
            Err(e) => {
                debug!(%address, error = %e, "reverse lookup failed");
                address.to_string()
            }
        }
    }
}

/// The IPv4 address of the interface used for outbound traffic.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub fn local_ipv4() -> Ipv4Addr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(1, 1, 1, 1), 80))?;
        Ok(socket.local_addr()?.ip())
    };
    match probe() {
        Ok(IpAddr::V4(ip)) if !ip.is_unspecified() => ip,
        Ok(_) => Ipv4Addr::LOCALHOST,
        Err(e) => {
            warn!(error = %e, "no route found, defaulting to loopback");
            Ipv4Addr::LOCALHOST
        }
    }
}

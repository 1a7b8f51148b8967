//! Port scan coordination.

use crate::engine::{Engine, EngineConfig, OutcomeSink, RetryPolicy, RunStats, TargetStream};
use crate::error::{ConfigError, ConfigResult, EngineError, SpecResult};
use crate::output::{NullReporter, Reporter};
use crate::probe::{ConnectProbe, Connector, ProbeOutcome, TcpConnector, UdpConnector};
use crate::resolve::{DnsResolver, HostnameResolver};
use crate::store::{Host, Port, Protocol, ResultStore};
use crate::types::{PortSpec, ScanTarget, TargetSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Settings for one port scan. Immutable once built.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub targets: TargetSpec,
    pub ports: PortSpec,
    pub protocol: Protocol,
    wait: Duration,
    pub workers: usize,
    pub show_refused: bool,
    pub grab_banners: bool,
    pub resolve_hostnames: bool,
    /// Probes per second, 0 for unlimited.
    pub rate_limit: u32,
}

impl ScanConfig {
    pub const DEFAULT_WAIT_SECS: f64 = 3.0;
    pub const DEFAULT_WORKERS: usize = 500;

    pub fn new(targets: TargetSpec, ports: PortSpec) -> Self {
        Self {
            targets,
            ports,
            protocol: Protocol::Tcp,
            wait: Duration::from_secs_f64(Self::DEFAULT_WAIT_SECS),
            workers: Self::DEFAULT_WORKERS,
            show_refused: false,
            grab_banners: false,
            resolve_hostnames: true,
            rate_limit: 0,
        }
    }

    /// Parse target and port text; `None` ports means the defaults.
    pub fn parse(targets: &str, ports: Option<&str>) -> SpecResult<Self> {
        let targets = TargetSpec::parse(targets)?;
        let ports = match ports {
            Some(text) => text.parse()?,
            None => PortSpec::default_ports(),
        };
        Ok(Self::new(targets, ports))
    }

    /// Set the connect and banner timeout in fractional seconds.
    pub fn with_wait_secs(mut self, secs: f64) -> ConfigResult<Self> {
        self.wait = positive_duration(secs).ok_or(ConfigError::InvalidWaitTime(secs))?;
        Ok(self)
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_show_refused(mut self, show: bool) -> Self {
        self.show_refused = show;
        self
    }

    pub fn with_banners(mut self, grab: bool) -> Self {
        self.grab_banners = grab;
        self
    }

    pub fn with_hostname_resolution(mut self, resolve: bool) -> Self {
        self.resolve_hostnames = resolve;
        self
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit = per_second;
        self
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

/// Seconds as a duration, if strictly positive and finite.
pub(crate) fn positive_duration(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// A host whose name was looked up after the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedHost {
    pub address: IpAddr,
    pub hostname: String,
}

/// Everything a finished scan produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub protocol: Protocol,
    /// Connection attempts made.
    pub ports_scanned: usize,
    pub open_ports: usize,
    /// Hosts sorted by address.
    pub hosts: Vec<Host>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resolved: Vec<ResolvedHost>,
    #[serde(skip)]
    pub stats: RunStats,
}

/// Records connect outcomes in the store and reports them live.
struct PortSink {
    store: Arc<ResultStore>,
    protocol: Protocol,
    reporter: Arc<dyn Reporter>,
}

impl OutcomeSink<ScanTarget> for PortSink {
    fn record(&self, target: &ScanTarget, outcome: &ProbeOutcome, _attempt: u32) {
        let port = Port::from_outcome(target.port, self.protocol, outcome);
        self.store.record_port(target.address, port, |host, port| {
            self.reporter.port_recorded(host, port)
        });
    }
}

/// Runs a port scan over the engine.
pub struct PortScanner {
    config: ScanConfig,
    connector: Arc<dyn Connector>,
    resolver: Option<Arc<dyn HostnameResolver>>,
    reporter: Arc<dyn Reporter>,
    store: Arc<ResultStore>,
}

impl PortScanner {
    /// A scanner using the transport named in `config`.
    pub fn new(config: ScanConfig) -> Self {
        let connector: Arc<dyn Connector> = match config.protocol {
            Protocol::Tcp => Arc::new(TcpConnector),
            Protocol::Udp => Arc::new(UdpConnector),
        };
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: ScanConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            resolver: None,
            reporter: Arc::new(NullReporter),
            store: Arc::new(ResultStore::new()),
        }
    }

    /// Use `resolver` instead of the system DNS resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn HostnameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Probe every host/port pair, then resolve hostnames if enabled.
    pub async fn run(&self) -> Result<ScanReport, EngineError> {
        let started_at = Utc::now();
        let hosts = self.config.targets.addresses();
        let ports = self.config.ports.to_ports();
        info!(
            hosts = hosts.len(),
            ports = ports.len(),
            protocol = %self.config.protocol,
            "starting scan"
        );

        let engine = Engine::new(
            EngineConfig::new(self.config.workers)
                .with_retry_policy(RetryPolicy::none())
                .with_rate_limit(self.config.rate_limit),
        );
        let probe = Arc::new(ConnectProbe::new(
            Arc::clone(&self.connector),
            self.config.wait,
            self.config.grab_banners,
        ));
        let sink = Arc::new(PortSink {
            store: Arc::clone(&self.store),
            protocol: self.connector.protocol(),
            reporter: Arc::clone(&self.reporter),
        });

        let stats = engine
            .run(TargetStream::scan(hosts, ports), probe, sink)
            .await?;
        debug!(elapsed = ?stats.elapsed, dispatched = stats.dispatched, "scan drained");

        let resolved = if self.config.resolve_hostnames {
            self.resolve_hostnames().await
        } else {
            Vec::new()
        };

        Ok(ScanReport {
            started_at,
            finished_at: Utc::now(),
            protocol: self.connector.protocol(),
            ports_scanned: stats.dispatched,
            open_ports: self.store.open_port_count(),
            hosts: self.store.ordered_hosts(),
            resolved,
            stats,
        })
    }

    /// Look up names for hosts with at least one open port, one at a time.
    async fn resolve_hostnames(&self) -> Vec<ResolvedHost> {
        let resolver = match &self.resolver {
            Some(resolver) => Arc::clone(resolver),
            None => Arc::new(DnsResolver::from_system()),
        };

        let mut addresses = self.store.addresses_with_open_ports();
        addresses.sort_unstable();
        let mut resolved = Vec::with_capacity(addresses.len());
        for address in addresses {
            let hostname = resolver.resolve(address).await;
            self.store.set_hostname(address, hostname.clone());
            resolved.push(ResolvedHost { address, hostname });
        }
        resolved
    }
}

//! Connect probing over a pluggable transport.

use super::{Probe, ProbeOutcome};
use crate::banner;
use crate::store::Protocol;
use crate::types::ScanTarget;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use super::tcp::TcpConnector;
use super::udp::UdpConnector;

/// An established connection a banner can be read from.
#[async_trait]
pub trait Connection: Send {
    /// One read into `buf`.
    async fn read_banner(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Result of one connect attempt.
pub enum ConnectAttempt {
    Connected(Box<dyn Connection>),
    /// Raw OS error code of the failure.
    Failed(i32),
}

impl ConnectAttempt {
    /// Fold an I/O error into a failed attempt.
    pub fn from_error(err: &io::Error) -> Self {
        Self::Failed(error_code(err))
    }
}

impl std::fmt::Debug for ConnectAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => write!(f, "Connected"),
            Self::Failed(code) => write!(f, "Failed({})", code),
        }
    }
}

/// Opens connections of one transport.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    fn protocol(&self) -> Protocol;

    /// Connect to `addr`, giving up after `wait`.
    async fn connect(&self, addr: SocketAddr, wait: Duration) -> ConnectAttempt;
}

/// OS error code for `err`, mapping errors without one to the closest errno.
pub fn error_code(err: &io::Error) -> i32 {
    err.raw_os_error().unwrap_or(match err.kind() {
        io::ErrorKind::TimedOut => libc::ETIMEDOUT,
        io::ErrorKind::ConnectionRefused => libc::ECONNREFUSED,
        io::ErrorKind::ConnectionReset => libc::ECONNRESET,
        io::ErrorKind::WouldBlock => libc::EAGAIN,
        _ => libc::EIO,
    })
}

/// Codes recorded in results but kept out of live output.
pub const SUPPRESSED_CODES: [i32; 4] = [
    libc::EAGAIN,
    libc::ETIMEDOUT,
    libc::EHOSTDOWN,
    libc::EHOSTUNREACH,
];

/// Whether a failure code is too noisy for live output.
pub fn is_suppressed(code: i32) -> bool {
    SUPPRESSED_CODES.contains(&code)
}

/// Classifies ports as open or closed by connecting to them.
#[derive(Clone)]
pub struct ConnectProbe {
    connector: Arc<dyn Connector>,
    wait: Duration,
    grab_banners: bool,
}

impl ConnectProbe {
    pub fn new(connector: Arc<dyn Connector>, wait: Duration, grab_banners: bool) -> Self {
        Self {
            connector,
            wait,
            grab_banners,
        }
    }

    /// TCP connect probe.
    pub fn tcp(wait: Duration, grab_banners: bool) -> Self {
        Self::new(Arc::new(TcpConnector), wait, grab_banners)
    }

    /// UDP connect probe.
    pub fn udp(wait: Duration, grab_banners: bool) -> Self {
        Self::new(Arc::new(UdpConnector), wait, grab_banners)
    }

    pub fn protocol(&self) -> Protocol {
        self.connector.protocol()
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

#[async_trait]
impl Probe for ConnectProbe {
    type Target = ScanTarget;

    async fn probe(&self, target: &ScanTarget) -> ProbeOutcome {
        match self.connector.connect(target.socket_addr(), self.wait).await {
            ConnectAttempt::Connected(mut conn) => {
                let banner = if self.grab_banners {
                    banner::read_banner(conn.as_mut(), self.wait).await
                } else {
                    None
                };
                ProbeOutcome::open().with_detail(banner)
            }
            ConnectAttempt::Failed(code) => ProbeOutcome::closed(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::OutcomeKind;
    use crate::types::PortNumber;

    struct Greeting;

    #[async_trait]
    impl Connection for Greeting {
        async fn read_banner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let text = b"220 mail ready\r\n";
            buf[..text.len()].copy_from_slice(text);
            Ok(text.len())
        }
    }

    /// Port 25 accepts and greets, everything else is refused.
    struct FakeConnector;

    #[async_trait]
    impl Connector for FakeConnector {
        fn protocol(&self) -> Protocol {
            Protocol::Tcp
        }

        async fn connect(&self, addr: SocketAddr, _wait: Duration) -> ConnectAttempt {
            if addr.port() == 25 {
                ConnectAttempt::Connected(Box::new(Greeting))
            } else {
                ConnectAttempt::Failed(libc::ECONNREFUSED)
            }
        }
    }

    fn target(port: u16) -> ScanTarget {
        ScanTarget::new("10.0.0.1".parse().unwrap(), PortNumber::new(port).unwrap())
    }

    #[tokio::test]
    async fn test_open_with_banner() {
        let probe = ConnectProbe::new(Arc::new(FakeConnector), Duration::from_secs(1), true);
        let outcome = probe.probe(&target(25)).await;
        assert_eq!(outcome.kind, OutcomeKind::Open);
        assert_eq!(outcome.code, 0);
        assert_eq!(outcome.detail.as_deref(), Some("220 mail ready"));
    }

    #[tokio::test]
    async fn test_banner_skipped_when_disabled() {
        let probe = ConnectProbe::new(Arc::new(FakeConnector), Duration::from_secs(1), false);
        let outcome = probe.probe(&target(25)).await;
        assert_eq!(outcome.kind, OutcomeKind::Open);
        assert_eq!(outcome.detail, None);
    }

    #[tokio::test]
    async fn test_refused_keeps_code() {
        let probe = ConnectProbe::new(Arc::new(FakeConnector), Duration::from_secs(1), true);
        let outcome = probe.probe(&target(26)).await;
        assert_eq!(outcome, ProbeOutcome::closed(libc::ECONNREFUSED));
    }

    #[test]
    fn test_error_code_mapping() {
        let refused = io::Error::from_raw_os_error(libc::ECONNREFUSED);
        assert_eq!(error_code(&refused), libc::ECONNREFUSED);
        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(error_code(&timed_out), libc::ETIMEDOUT);
    }

    #[test]
    fn test_suppressed_codes() {
        assert!(is_suppressed(libc::EHOSTUNREACH));
        assert!(is_suppressed(libc::ETIMEDOUT));
        assert!(!is_suppressed(libc::ECONNREFUSED));
    }
}

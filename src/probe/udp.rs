//! UDP transport.
//!
//! A UDP "connect" only fixes the peer address locally, so it succeeds for
//! any reachable route and failures are limited to what the OS reports
//! straight away (no route, bad address).

use super::connect::{ConnectAttempt, Connection, Connector};
use crate::store::Protocol;
use async_trait::async_trait;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::trace;

/// Connects a UDP socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConnector;

impl UdpConnector {
    async fn open(addr: SocketAddr) -> io::Result<UdpSocket> {
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        Ok(socket)
    }
}

#[async_trait]
impl Connector for UdpConnector {
    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }

    async fn connect(&self, addr: SocketAddr, wait: Duration) -> ConnectAttempt {
        match timeout(wait, Self::open(addr)).await {
            Ok(Ok(socket)) => ConnectAttempt::Connected(Box::new(socket)),
            Ok(Err(e)) => {
                trace!(%addr, error = %e, "udp connect failed");
                ConnectAttempt::from_error(&e)
            }
            Err(_) => ConnectAttempt::Failed(libc::ETIMEDOUT),
        }
    }
}

#[async_trait]
impl Connection for UdpSocket {
    async fn read_banner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_connect_succeeds_without_listener() {
        let attempt = UdpConnector
            .connect("127.0.0.1:9".parse().unwrap(), Duration::from_secs(1))
            .await;
        assert!(matches!(attempt, ConnectAttempt::Connected(_)));
    }

    #[tokio::test]
    async fn test_udp_socket_reads_as_connection() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut client = UdpConnector::open(server.local_addr().unwrap()).await.unwrap();
        server
            .send_to(b"hello\r\n", client.local_addr().unwrap())
            .await
            .unwrap();

        let banner = crate::banner::read_banner(&mut client, Duration::from_secs(1)).await;
        assert_eq!(banner.as_deref(), Some("hello"));
    }
}

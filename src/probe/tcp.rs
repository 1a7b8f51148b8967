//! TCP connect transport.
//!
//! A full handshake through the OS socket API; needs no privileges.

use super::connect::{ConnectAttempt, Connection, Connector};
use crate::store::Protocol;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Connects over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }

    async fn connect(&self, addr: SocketAddr, wait: Duration) -> ConnectAttempt {
        match timeout(wait, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => ConnectAttempt::Connected(Box::new(stream)),
            Ok(Err(e)) => {
                trace!(%addr, error = %e, "tcp connect failed");
                ConnectAttempt::from_error(&e)
            }
            Err(_) => ConnectAttempt::Failed(libc::ETIMEDOUT),
        }
    }
}

#[async_trait]
impl Connection for TcpStream {
    async fn read_banner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listener_and_reads_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"SSH-2.0-test\r\n").await.unwrap();
        });

        let mut conn = match TcpConnector.connect(addr, Duration::from_secs(2)).await {
            ConnectAttempt::Connected(conn) => conn,
            other => panic!("expected a connection, got {:?}", other),
        };
        let banner = crate::banner::read_banner(conn.as_mut(), Duration::from_secs(2)).await;
        assert_eq!(banner.as_deref(), Some("SSH-2.0-test"));
    }

    #[tokio::test]
    async fn test_refused_port_reports_code() {
        // Bind then drop to find a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        match TcpConnector.connect(addr, Duration::from_secs(2)).await {
            ConnectAttempt::Failed(code) => assert_eq!(code, libc::ECONNREFUSED),
            other => panic!("expected refusal, got {:?}", other),
        }
    }
}

//! Banner capture from open connections.
//!
//! One read, no probe payload: whatever the service volunteers within the
//! wait time is the banner.

use crate::probe::Connection;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

/// Maximum bytes read for a banner.
pub const MAX_BANNER_SIZE: usize = 1024;

/// Read a banner from `conn`, giving up after `wait`.
pub async fn read_banner(conn: &mut dyn Connection, wait: Duration) -> Option<String> {
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];
    match timeout(wait, conn.read_banner(&mut buffer)).await {
        Ok(Ok(n)) => decode_banner(&buffer[..n]),
        Ok(Err(e)) => {
            trace!(error = %e, "banner read failed");
            None
        }
        Err(_) => None,
    }
}

/// Decode raw banner bytes: lossy UTF-8, trailing CR/LF removed, empty is
/// no banner.
pub fn decode_banner(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    let text = text.trim_end_matches(['\r', '\n']);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

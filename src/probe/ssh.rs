//! SSH password authentication.
//!
//! libssh2 is blocking, so every attempt runs on tokio's blocking pool with
//! the session timeout bounding each protocol step.

use super::connect::error_code;
use super::credential::{AuthAttempt, Authenticator};
use crate::types::Credential;
use async_trait::async_trait;
use ssh2::{ErrorCode, Session};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tracing::trace;

/// LIBSSH2_ERROR_AUTHENTICATION_FAILED
const AUTHENTICATION_FAILED: i32 = -18;

/// Tries passwords over SSH.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshAuthenticator;

impl SshAuthenticator {
    fn attempt(host: SocketAddr, credential: &Credential, timeout: Duration) -> AuthAttempt {
        let tcp = match TcpStream::connect_timeout(&host, timeout) {
            Ok(tcp) => tcp,
            Err(e) => {
                return AuthAttempt::Failed {
                    code: error_code(&e),
                    reason: e.to_string(),
                }
            }
        };

        let mut session = match Session::new() {
            Ok(session) => session,
            Err(e) => return failed(&e),
        };
        session.set_timeout(session_timeout_ms(timeout));
        session.set_tcp_stream(tcp);

        if let Err(e) = session.handshake() {
            return failed(&e);
        }

        let attempt = match session.userauth_password(&credential.username, &credential.secret) {
            Ok(()) if session.authenticated() => AuthAttempt::Accepted,
            Ok(()) => AuthAttempt::Denied {
                code: AUTHENTICATION_FAILED,
            },
            Err(e) if session_code(&e) == AUTHENTICATION_FAILED => AuthAttempt::Denied {
                code: AUTHENTICATION_FAILED,
            },
            Err(e) => failed(&e),
        };

        if let Err(e) = session.disconnect(None, "done", None) {
            trace!(error = %e, "ssh disconnect failed");
        }
        attempt
    }
}

// libssh2 reads 0 as "wait forever", so sub-millisecond timeouts round up.
fn session_timeout_ms(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}

fn session_code(err: &ssh2::Error) -> i32 {
    match err.code() {
        ErrorCode::Session(code) | ErrorCode::SFTP(code) => code,
    }
}

fn failed(err: &ssh2::Error) -> AuthAttempt {
    AuthAttempt::Failed {
        code: session_code(err),
        reason: err.message().to_string(),
    }
}

#[async_trait]
impl Authenticator for SshAuthenticator {
    async fn authenticate(
        &self,
        host: SocketAddr,
        credential: &Credential,
        timeout: Duration,
    ) -> AuthAttempt {
        let credential = credential.clone();
        match tokio::task::spawn_blocking(move || Self::attempt(host, &credential, timeout)).await {
            Ok(attempt) => attempt,
            Err(e) => AuthAttempt::Failed {
                code: libc::EIO,
                reason: e.to_string(),
            },
        }
    }

    /// Connect and every libssh2 call are bounded by `timeout` already.
    fn deadline(&self, _timeout: Duration) -> Option<Duration> {
        None
    }
}

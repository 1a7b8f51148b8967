//! Credential testing coordination.

use super::ports::positive_duration;
use crate::engine::{Engine, EngineConfig, OutcomeSink, RetryPolicy, RunStats, TargetStream};
use crate::error::{ConfigError, ConfigResult, EngineError};
use crate::output::{NullReporter, Reporter};
use crate::probe::{Authenticator, CredentialProbe, OutcomeKind, ProbeOutcome, SshAuthenticator};
use crate::store::{CredentialLedger, CredentialSummary};
use crate::types::Credential;
use serde::Serialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for one credential run against a single host.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    host: SocketAddr,
    username: String,
    candidates: Vec<String>,
    timeout: Duration,
    pub workers: usize,
    pub retry: RetryPolicy,
    /// Attempts per second, 0 for unlimited.
    pub rate_limit: u32,
}

impl CredentialConfig {
    pub const DEFAULT_PORT: u16 = 22;
    pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
    pub const DEFAULT_WORKERS: usize = 5;

    /// Fails when there is nothing to try.
    pub fn new(
        address: IpAddr,
        username: impl Into<String>,
        candidates: Vec<String>,
    ) -> ConfigResult<Self> {
        if candidates.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        Ok(Self {
            host: SocketAddr::new(address, Self::DEFAULT_PORT),
            username: username.into(),
            candidates,
            timeout: Duration::from_secs_f64(Self::DEFAULT_TIMEOUT_SECS),
            workers: Self::DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
            rate_limit: 0,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.host.set_port(port);
        self
    }

    /// Per-attempt timeout in fractional seconds.
    pub fn with_timeout_secs(mut self, secs: f64) -> ConfigResult<Self> {
        self.timeout = positive_duration(secs).ok_or(ConfigError::InvalidWaitTime(secs))?;
        Ok(self)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit = per_second;
        self
    }

    pub fn host(&self) -> SocketAddr {
        self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Read candidate secrets, one per line, line endings stripped.
/// Lines that are not valid UTF-8 are skipped with a warning.
pub fn read_candidates(path: &Path) -> ConfigResult<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut lines: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let mut skipped = 0usize;
    let mut candidates = Vec::with_capacity(lines.len());
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        match std::str::from_utf8(line) {
            Ok(secret) => candidates.push(secret.to_string()),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping candidate that is not valid UTF-8"
                );
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "some candidates were not read");
    }

    if candidates.is_empty() {
        return Err(ConfigError::NoCandidates);
    }
    Ok(candidates)
}

/// Outcome of a finished credential run.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialReport {
    pub summary: CredentialSummary,
    /// Connection attempts made, retries included.
    pub attempts: usize,
    pub retried: usize,
    #[serde(skip)]
    pub stats: RunStats,
}

struct LedgerSink {
    ledger: Arc<CredentialLedger>,
    reporter: Arc<dyn Reporter>,
}

impl OutcomeSink<Credential> for LedgerSink {
    fn record(&self, credential: &Credential, outcome: &ProbeOutcome, attempt: u32) {
        let host = self.ledger.host();
        match outcome.kind {
            OutcomeKind::Authenticated => {
                self.ledger
                    .record_success(credential, |record| self.reporter.credential_found(record));
            }
            OutcomeKind::Errored => {
                warn!(
                    username = %credential.username,
                    %host,
                    retries = attempt,
                    reason = outcome.detail.as_deref().unwrap_or("unknown"),
                    "giving up on candidate"
                );
                self.ledger.record_abandoned(credential);
            }
            _ => {
                info!(
                    "{}@{} / {} is incorrect",
                    credential.username,
                    host.ip(),
                    credential.secret
                );
                self.ledger.record_rejection();
            }
        }
    }

    fn retrying(&self, credential: &Credential, outcome: &ProbeOutcome, attempt: u32) {
        warn!(
            username = %credential.username,
            host = %self.ledger.host(),
            attempt = attempt + 1,
            reason = outcome.detail.as_deref().unwrap_or("unknown"),
            "connection rejected, retrying"
        );
    }
}

/// Tries every candidate secret against one host.
pub struct CredentialTester {
    config: CredentialConfig,
    authenticator: Arc<dyn Authenticator>,
    reporter: Arc<dyn Reporter>,
    ledger: Arc<CredentialLedger>,
}

impl CredentialTester {
    /// A tester speaking SSH.
    pub fn new(config: CredentialConfig) -> Self {
        Self::with_authenticator(config, Arc::new(SshAuthenticator))
    }

    pub fn with_authenticator(config: CredentialConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        let ledger = Arc::new(CredentialLedger::new(config.host));
        Self {
            config,
            authenticator,
            reporter: Arc::new(NullReporter),
            ledger,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn ledger(&self) -> &CredentialLedger {
        &self.ledger
    }

    pub async fn run(&self) -> Result<CredentialReport, EngineError> {
        info!(
            host = %self.config.host,
            username = %self.config.username,
            candidates = self.config.candidates.len(),
            "starting credential run"
        );

        let engine = Engine::new(
            EngineConfig::new(self.config.workers)
                .with_retry_policy(self.config.retry)
                .with_rate_limit(self.config.rate_limit),
        );
        let probe = Arc::new(CredentialProbe::new(
            Arc::clone(&self.authenticator),
            self.config.host,
            self.config.timeout,
        ));
        let sink = Arc::new(LedgerSink {
            ledger: Arc::clone(&self.ledger),
            reporter: Arc::clone(&self.reporter),
        });
        let stream = TargetStream::credentials(
            self.config.username.clone(),
            self.config.candidates.clone(),
        );

        let stats = engine.run(stream, probe, sink).await?;
        debug!(elapsed = ?stats.elapsed, "credential run drained");

        Ok(CredentialReport {
            summary: self.ledger.summary(),
            attempts: stats.dispatched,
            retried: stats.retried,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::AuthAttempt;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;

    /// Fails each secret a scripted number of times, then accepts only
    /// `correct`.
    struct FakeServer {
        correct: &'static str,
        failures: Mutex<HashMap<String, u32>>,
    }

    impl FakeServer {
        fn new(correct: &'static str) -> Self {
            Self {
                correct,
                failures: Mutex::new(HashMap::new()),
            }
        }

        fn flaky(self, secret: &str, times: u32) -> Self {
            self.failures.lock().unwrap().insert(secret.to_string(), times);
            self
        }
    }

    #[async_trait]
    impl Authenticator for FakeServer {
        async fn authenticate(
            &self,
            _host: SocketAddr,
            credential: &Credential,
            _timeout: Duration,
        ) -> AuthAttempt {
            tokio::task::yield_now().await;
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(left) = failures.get_mut(&credential.secret) {
                    if *left > 0 {
                        *left -= 1;
                        return AuthAttempt::Failed {
                            code: libc::ECONNRESET,
                            reason: "connection reset".into(),
                        };
                    }
                }
            }
            if credential.secret == self.correct {
                AuthAttempt::Accepted
            } else {
                AuthAttempt::Denied { code: -18 }
            }
        }
    }

    fn fast_retries(max: u32) -> RetryPolicy {
        RetryPolicy::new(max).with_backoff(Duration::ZERO, Duration::ZERO)
    }

    fn candidates(secrets: &[&str]) -> Vec<String> {
        secrets.iter().map(|s| s.to_string()).collect()
    }

    fn config(secrets: &[&str]) -> CredentialConfig {
        CredentialConfig::new("10.0.0.9".parse().unwrap(), "root", candidates(secrets))
            .unwrap()
            .with_retry_policy(fast_retries(5))
    }

    #[test]
    fn test_no_candidates_rejected() {
        let result = CredentialConfig::new("10.0.0.9".parse().unwrap(), "root", Vec::new());
        assert!(matches!(result, Err(ConfigError::NoCandidates)));
    }

    #[test]
    fn test_timeout_must_be_positive() {
        assert!(config(&["a"]).with_timeout_secs(0.0).is_err());
        assert!(config(&["a"]).with_timeout_secs(-2.0).is_err());
        assert_eq!(
            config(&["a"]).with_timeout_secs(1.5).unwrap().timeout(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_default_port_and_override() {
        assert_eq!(config(&["a"]).host().port(), 22);
        assert_eq!(config(&["a"]).with_port(2222).host().port(), 2222);
    }

    #[test]
    fn test_read_candidates_strips_line_endings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"alpha\r\nbeta\n\ngamma").unwrap();
        let secrets = read_candidates(file.path()).unwrap();
        assert_eq!(secrets, vec!["alpha", "beta", "", "gamma"]);
    }

    #[test]
    fn test_read_candidates_skips_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"caf\xe9\nplain\n").unwrap();
        let secrets = read_candidates(file.path()).unwrap();
        assert_eq!(secrets, vec!["plain"]);
        assert!(secrets.iter().all(|s| !s.contains('\u{fffd}')));
    }

    #[test]
    fn test_read_candidates_only_invalid_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"caf\xe9\r\n\xff\xfe\n").unwrap();
        assert!(matches!(
            read_candidates(file.path()),
            Err(ConfigError::NoCandidates)
        ));
    }

    #[test]
    fn test_read_candidates_missing_file() {
        let result = read_candidates(Path::new("/nonexistent/passwords.txt"));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[tokio::test]
    async fn test_rejections_then_success() {
        let tester = CredentialTester::with_authenticator(
            config(&["a", "b", "c", "secret"]),
            Arc::new(FakeServer::new("secret")),
        );
        let report = tester.run().await.unwrap();

        assert_eq!(report.summary.found.len(), 1);
        assert_eq!(report.summary.found[0].secret, "secret");
        assert_eq!(report.summary.found[0].username, "root");
        assert_eq!(report.summary.rejected, 3);
        assert_eq!(report.retried, 0);
        assert_eq!(report.attempts, 4);
        assert_eq!(report.summary.abandoned, 0);
    }

    #[tokio::test]
    async fn test_errored_candidates_are_retried() {
        let server = FakeServer::new("b").flaky("a", 2).flaky("b", 1);
        let tester = CredentialTester::with_authenticator(
            config(&["a", "b"]).with_workers(2),
            Arc::new(server),
        );
        let report = tester.run().await.unwrap();

        assert_eq!(report.retried, 3);
        assert_eq!(report.attempts, 5);
        assert_eq!(report.summary.rejected, 1);
        assert_eq!(report.summary.found.len(), 1);
        assert_eq!(report.summary.found[0].secret, "b");
    }

    #[tokio::test]
    async fn test_persistent_errors_are_abandoned() {
        let server = FakeServer::new("zzz").flaky("a", u32::MAX);
        let tester = CredentialTester::with_authenticator(
            config(&["a"]).with_retry_policy(fast_retries(2)),
            Arc::new(server),
        );
        let report = tester.run().await.unwrap();

        assert_eq!(report.attempts, 3);
        assert_eq!(report.summary.abandoned, 1);
        assert_eq!(tester.ledger().abandoned()[0].secret, "a");
        assert!(report.summary.found.is_empty());
    }
}

//! # prowl - concurrent port scanner and SSH credential tester
//!
//! Both tools share one probing engine: a lazy stream of targets feeds a
//! bounded queue, a fixed pool of tokio workers runs a [`probe::Probe`]
//! against each target, and classified outcomes are aggregated into a shared
//! store. Transient failures go back through the queue under a
//! [`engine::RetryPolicy`].
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use prowl::scanner::{PortScanner, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::parse("192.168.1.0/24", Some("22,80,443"))?
//!         .with_wait_secs(0.5)?
//!         .with_workers(200);
//!     let report = PortScanner::new(config).run().await?;
//!
//!     for host in &report.hosts {
//!         for port in host.open_ports() {
//!             println!("{}:{} open", host.address, port.number);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Targets, ports and credentials with validated parsing
//! - [`engine`] - Target stream, dispatch queue, worker pool and retry policy
//! - [`probe`] - The `Probe` trait with connect and credential strategies
//! - [`store`] - Thread-safe result aggregation
//! - [`scanner`] - Port scan and credential run coordinators
//! - [`resolve`] - Reverse DNS and local address discovery
//! - [`config`] - Settings file handling
//! - [`output`] - Live lines and final reports
//! - [`limits`] - Open-file limit bootstrap
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod limits;
pub mod output;
pub mod probe;
pub mod resolve;
pub mod scanner;
pub mod store;
pub mod types;

pub use engine::{Engine, EngineConfig, RetryPolicy, RunStats};
pub use error::{CliError, ConfigError, EngineError, SpecError};
pub use probe::{OutcomeKind, Probe, ProbeOutcome};
pub use store::{Host, Port, ResultStore};
pub use types::{Credential, PortNumber, PortSpec, ScanTarget, TargetSpec};

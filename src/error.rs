//! Error types for prowl.
//!
//! Uses `thiserror` for ergonomic error definitions. Only specification and
//! configuration errors are fatal; per-probe failures are classified into
//! outcomes and never cross a worker boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed target or port text. Raised before the engine starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid CIDR block: {0} (only a.b.c.0/24 is supported)")]
    InvalidCidr(String),

    #[error("no valid addresses in list: {0}")]
    EmptyTargetList(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u32),

    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),

    #[error("empty port specification")]
    EmptyPorts,
}

/// Invalid engine or application configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("wait time must be a positive number of seconds, got {0}")]
    InvalidWaitTime(f64),

    #[error("no candidate secrets supplied")]
    NoCandidates,

    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),
}

/// Failure of the engine itself, as opposed to a probe.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("worker task failed: {0}")]
    WorkerFailed(#[from] tokio::task::JoinError),
}

/// Top-level error for the command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for specification parsing.
pub type SpecResult<T> = Result<T, SpecError>;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for command handlers.
pub type CliResult<T> = Result<T, CliError>;

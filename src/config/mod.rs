//! Configuration management for prowl.
//!
//! Provides XDG-compliant settings storage with per-command defaults.

mod settings;

pub use settings::{Paths, ScanDefaults, Settings, SshDefaults};

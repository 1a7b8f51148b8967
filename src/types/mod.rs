//! Core type definitions using newtype patterns for type safety.
//!
//! These types reject malformed target and port text before any probing
//! starts.

mod credential;
mod port;
mod target;

pub use credential::{Credential, CredentialRecord};
pub use port::{PortNumber, PortRange, PortSpec};
pub use target::{ScanTarget, TargetSpec};

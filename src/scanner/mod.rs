//! Coordinators that wire parsing, the engine and the stores into a run.

mod credentials;
mod ports;

pub use credentials::{read_candidates, CredentialConfig, CredentialReport, CredentialTester};
pub use ports::{PortScanner, ResolvedHost, ScanConfig, ScanReport};

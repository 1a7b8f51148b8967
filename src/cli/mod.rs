//! CLI subcommand definitions and handlers.
//!
//! - `prowl scan [target]` - Scan hosts for open ports
//! - `prowl ssh <target>` - Try passwords against an SSH server

mod scan;
mod ssh;

pub use scan::ScanCommand;
pub use ssh::SshCommand;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// prowl - concurrent port scanner and SSH credential tester.
#[derive(Parser, Debug)]
#[command(name = "prowl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent TCP/UDP port scanner and SSH credential tester", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress live progress lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan hosts for open ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Try candidate passwords against an SSH server
    Ssh(SshCommand),
}

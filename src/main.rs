use anyhow::Context;
use clap::Parser;
use prowl::cli::{Cli, Commands};
use prowl::config::Settings;
use prowl::{limits, output};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let ceiling = limits::apply_resource_limits();
    debug!(ceiling, "worker ceiling");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    match &cli.command {
        Commands::Scan(scan) => scan.execute(&settings, cli.quiet).await?,
        Commands::Ssh(ssh) => ssh.execute(&settings, cli.quiet).await?,
    }
    Ok(())
}

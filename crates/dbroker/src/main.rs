//! dbroker CLI - database service broker
//!
//! Provisions, binds and removes operator-managed database instances.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS connection is opened
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Provision(args) => commands::provision::run(args, config).await,
        Commands::Deprovision(args) => commands::deprovision::run(args, config).await,
        Commands::Bind(args) => commands::bind::run(args, config).await,
        Commands::Unbind(args) => commands::unbind::run(args, config).await,
        Commands::Info(args) => commands::info::run(args, config).await,
        Commands::Services(args) => commands::services::run(args, config),
    };

    if let Err(err) = result {
        let status = output::status_code(&err);
        output::failure(status, &err)?;
        std::process::exit(output::exit_code(status));
    }
    Ok(())
}

/// Initialize tracing with appropriate verbosity
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

//! URL Harvest main entry point
//!
//! This is the command-line interface for the URL Harvest fetch service.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use url_harvest::config::{format_duration, load_effective_config, Config};
use url_harvest::server::{self, AppState};
use url_harvest::FetchService;

/// URL Harvest: a concurrent URL fetching service
///
/// Accepts batches of URLs over HTTP, fetches them concurrently, and keeps
/// the results in memory for retrieval until they expire.
#[derive(Parser, Debug)]
#[command(name = "url-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent URL fetching service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    let (config, config_hash) = load_effective_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(hash) = &config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    if cli.check_config {
        return handle_check_config(&config);
    }

    handle_serve(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("url_harvest=info,warn"),
            1 => EnvFilter::new("url_harvest=debug,info"),
            2 => EnvFilter::new("url_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --check-config: prints the effective configuration
fn handle_check_config(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;

    println!("=== URL Harvest Configuration ===\n");
    println!("{}", rendered);
    println!("✓ Configuration is valid");

    Ok(())
}

/// Runs the HTTP service until Ctrl-C
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Fetch limits: timeout {}, {} redirects, {} bytes, {} concurrent",
        format_duration(config.fetch_options().timeout),
        config.fetch.max_redirects,
        config.fetch.max_content_size,
        config.fetch.max_concurrent_fetches
    );
    tracing::info!(
        "Rate limit: {} requests per {} (burst {})",
        config.rate_limit.requests,
        format_duration(config.rate_limit_window()),
        config.rate_limit.burst
    );
    tracing::info!(
        "Retention: TTL {}, cleanup every {}, max {} results",
        format_duration(config.retention_policy().ttl),
        format_duration(config.cleanup_interval()),
        config.retention.max_results
    );

    let service = Arc::new(FetchService::new(&config).context("Failed to start fetch service")?);
    let listener = TcpListener::bind(&config.server.address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.address))?;

    let state = AppState::new(Arc::clone(&service), Arc::new(config));
    let served = server::serve(listener, state, shutdown_signal()).await;

    service.shutdown().await;

    match served {
        Ok(()) => {
            tracing::info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Server failed: {}", e);
            Err(e.into())
        }
    }
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! Fakebook crawler main entry point
//!
//! This is the command-line interface: it assembles the configuration, runs
//! the crawl and prints the flags on stdout.

use anyhow::Context;
use clap::Parser;
use fakebook_crawler::config::{load_config_with_hash, validate, Config};
use fakebook_crawler::crawler::run_crawl;
use fakebook_crawler::output::write_flags;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Logs into Fakebook and hunts for its secret flags
///
/// The crawler authenticates with the given credentials, walks the site
/// breadth-first and prints every flag it finds, one per line. If the
/// expected number of flags was not found, `ERROR` is printed first.
#[derive(Parser, Debug)]
#[command(name = "fakebook-crawler")]
#[command(version)]
#[command(about = "Crawls Fakebook for secret flags", long_about = None)]
struct Cli {
    /// Server to crawl
    #[arg(short, long)]
    server: Option<String>,

    /// Port to connect to
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Speak plain HTTP instead of TLS
    #[arg(long)]
    plain: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Fakebook username
    username: String,

    /// Fakebook password
    password: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the crawl; returns whether the full set of flags was found
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = build_config(cli)?;

    tracing::info!(
        "Crawling {} as {}",
        config.server.authority(),
        config.credentials.username
    );
    let report = run_crawl(config).await.context("crawl failed")?;

    let stdout = std::io::stdout();
    write_flags(&report, &mut stdout.lock()).context("failed to write flags")?;

    Ok(report.is_complete())
}

/// Loads the optional config file and layers the command-line values on top
fn build_config(cli: Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(server) = cli.server {
        config.server.host = server;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.plain {
        config.server.tls = false;
    }
    config.credentials.username = cli.username;
    config.credentials.password = cli.password;

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fakebook_crawler=info,warn"),
            1 => EnvFilter::new("fakebook_crawler=debug,info"),
            _ => EnvFilter::new("fakebook_crawler=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use modkit_dsn::{lifecycle, DbConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// dsnctl - translate database connection URLs and check they answer
#[derive(Parser)]
#[command(name = "dsnctl")]
#[command(about = "dsnctl - translate database connection URLs and check they answer")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a YAML configuration file with a `database:` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connection URL (overrides config and DB__URL)
    #[arg(short, long)]
    url: Option<String>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the driver name and native DSN for the URL
    Translate {
        /// Print the password instead of redacting it
        #[arg(long)]
        reveal: bool,
    },
    /// Open the database and run one liveness probe
    Check {
        /// Seconds to wait for the probe
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = DbConfig::load_layered(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(path) => format!("failed to load configuration from {}", path.display()),
            None => "failed to load configuration".to_string(),
        })?;
    if let Some(url) = cli.url {
        config.url = url;
    }
    if config.url.trim().is_empty() {
        return Err(anyhow!(
            "database URL not configured (use --url, DB__URL or a config file)"
        ));
    }
    tracing::debug!(?config, "effective configuration");

    match cli.command {
        Commands::Translate { reveal } => translate(&config, reveal),
        Commands::Check { timeout } => check(&config, Duration::from_secs(timeout)).await,
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn translate(config: &DbConfig, reveal: bool) -> Result<()> {
    let source = modkit_dsn::translate(&config.url).context("translation failed")?;
    println!("dialect: {}", source.dialect());
    println!("driver:  {}", source.driver());
    println!(
        "dsn:     {}",
        if reveal { source.dsn() } else { source.redacted() }
    );
    Ok(())
}

async fn check(config: &DbConfig, timeout: Duration) -> Result<()> {
    let handle = modkit_dsn::open(config).context("failed to open database")?;
    tracing::info!(driver = handle.driver_name(), "opened handle");

    let started = lifecycle::start(&handle, timeout).await;
    let driver = handle.driver_name().to_string();
    lifecycle::stop(handle).await;
    started.with_context(|| format!("{driver} did not answer"))?;

    println!("{driver}: ok");
    Ok(())
}

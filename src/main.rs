//! IP enrichment CLI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zentinel_ip_enrich::{Config, Enricher};

#[derive(Parser, Debug)]
#[command(name = "zentinel-ip-enrich")]
#[command(about = "Enrich a list of IP addresses with AbuseIPDB reputation data and write a CSV report")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ip-enrich.yaml")]
    config: PathBuf,

    /// Input list, overrides input.path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Report path, overrides output.path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum distinct IPs to look up, overrides input.max_records
    #[arg(long)]
    max_records: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

// Lookups are strictly sequential, a single thread is all the run needs.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    info!(config = %args.config.display(), "Loading configuration");
    let mut config = Config::load(&args.config)?;

    if let Some(input) = args.input {
        config.input.path = input;
    }
    if let Some(output) = args.output {
        config.output.path = output;
    }
    if let Some(max_records) = args.max_records {
        config.input.max_records = max_records;
    }
    config.validate()?;

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    info!(
        input = %config.input.path.display(),
        output = %config.output.path.display(),
        max_records = config.input.max_records,
        "Starting enrichment run"
    );

    let enricher = Enricher::from_config(&config)?;
    let summary = enricher.run(&config).await?;

    println!("Done. Saved to {}", summary.output.display());

    Ok(())
}

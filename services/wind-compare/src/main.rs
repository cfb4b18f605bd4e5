//! Wind-speed comparison figure generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wind_compare::CompareConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "wind-compare")]
#[command(about = "Compare COSMO-REA2 and NEWA wind speeds in one figure")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "WIND_COMPARE_CONFIG")]
    config: PathBuf,

    /// Height label used in titles, e.g. `100` (overrides the config)
    #[arg(long)]
    height: Option<String>,

    /// Output image path (overrides the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log filter, e.g. `info` or `wind_compare=debug,renderer=warn`
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    info!(config = %args.config.display(), "Starting wind speed comparison");

    let mut config = CompareConfig::from_file(&args.config)?;
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    config.validate()?;

    let path = wind_compare::run(&config)?;
    info!(path = %path.display(), "Done");
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendsift::config::Config;
use trendsift::models::RawRecord;
use trendsift::pipeline::TrendPipeline;
use trendsift::storage::HistoryStore;

#[derive(Parser)]
#[command(
    name = "trendsift",
    version,
    about = "Multi-source product trend scoring and emerging-trend detection",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML); environment variables otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of collected records and persist the day's trends
    Analyze {
        /// JSON file containing an array of raw records
        #[arg(short, long)]
        input: PathBuf,

        /// Date to attribute the cycle to (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Write the report JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show stored trends for a date
    History {
        /// Date to query (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show emerging trends from the recent window
    Emerging {
        /// Days to look back
        #[arg(long, default_value = "7")]
        days: i64,

        /// Minimum emerging score
        #[arg(long, default_value = "0.75")]
        min_score: f64,
    },

    /// Prune trend history beyond the retention window
    Cleanup {
        /// Override the configured retention window (days)
        #[arg(long)]
        retention_days: Option<i64>,
    },

    /// Show history store statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let history = Arc::new(HistoryStore::new(&config.database.path)?);

    match cli.command {
        Commands::Analyze {
            input,
            date,
            output,
        } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            tracing::info!(input = %input.display(), date = %date, "Starting analyze command");

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read records from {}", input.display()))?;
            let records: Vec<RawRecord> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse records in {}", input.display()))?;

            let pipeline = TrendPipeline::new(&config, history);
            let report = pipeline.run(&records, date)?;

            if report.is_empty() {
                tracing::warn!("Analysis produced zero trends (no data)");
            }

            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write report to {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Report written");
                }
                None => println!("{json}"),
            }
        }

        Commands::History { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let trends = history.get_trends_by_date(date)?;
            println!("{}", serde_json::to_string_pretty(&trends)?);
        }

        Commands::Emerging { days, min_score } => {
            let trends = history.get_emerging_trends(days, min_score)?;
            println!("{}", serde_json::to_string_pretty(&trends)?);
        }

        Commands::Cleanup { retention_days } => {
            let retention = retention_days.unwrap_or(config.database.retention_days);
            let (trends, snapshots) = history.cleanup_old_data(retention)?;
            println!("Deleted {trends} trend rows and {snapshots} snapshots");
        }

        Commands::Stats => {
            let stats = history.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("trendsift=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("trendsift=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

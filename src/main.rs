// ABOUTME: CLI entry point for opendata-etl
// ABOUTME: Parses the job subcommand and routes to its handler

use clap::{Parser, Subcommand};
use opendata_etl::commands;
use opendata_etl::datasets;
use opendata_etl::socrata::LoadMethod;

#[derive(Parser)]
#[command(name = "opendata-etl")]
#[command(about = "Load 311 report and Open311 data into Socrata datasets", long_about = None)]
#[command(version)]
struct Cli {
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the 311 service request report
    Requests {
        /// Override the dataset's load method
        #[arg(long, value_enum)]
        method: Option<LoadMethod>,
    },
    /// Load the CSR activities report
    Activities {
        /// Override the dataset's load method
        #[arg(long, value_enum)]
        method: Option<LoadMethod>,
    },
    /// Load the CSR flex question/answer report
    FlexNotes {
        /// Override the dataset's load method
        #[arg(long, value_enum)]
        method: Option<LoadMethod>,
    },
    /// Sync recently updated requests from the Open311 API
    Open311 {
        /// Optional ISO 8601 date (e.g. 2025-10-15T06:55:01.132759+00:00) to start query from
        #[arg(short = 'd', long)]
        date: Option<String>,
        /// Upload every field the API returns instead of the dataset's columns
        #[arg(long)]
        all_fields: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // 1. RUST_LOG environment variable has highest precedence
    // 2. --log flag is used if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Requests { method } => commands::report::run(&datasets::REQUESTS, method).await,
        Commands::Activities { method } => {
            commands::report::run(&datasets::ACTIVITIES, method).await
        }
        Commands::FlexNotes { method } => {
            commands::report::run(&datasets::FLEX_NOTES, method).await
        }
        Commands::Open311 { date, all_fields } => {
            commands::open311::run(commands::open311::Open311Options { date, all_fields }).await
        }
    }
}

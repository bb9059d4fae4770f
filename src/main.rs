//! # Weathervane CLI
//!
//! One binary with a long-running `serve` command and two one-shot query
//! commands that print the same JSON the API would return.
//!
//! ```bash
//! weathervane --config ./config/weathervane.toml serve
//! weathervane sensor dockan humidity 2019-01-10
//! weathervane device dockan 2019-01-10
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use weathervane::config::load_config;
use weathervane::error::QueryError;
use weathervane::query::QueryEngine;
use weathervane::server::run_server;
use weathervane::storage::S3Store;

/// Weathervane — serve tiered IoT weather sensor readings from object
/// storage.
#[derive(Parser)]
#[command(
    name = "weathervane",
    about = "Read-only API for tiered IoT weather sensor readings",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/weathervane.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve,

    /// Print all readings for one device/sensor/date as JSON.
    Sensor {
        device_id: String,
        sensor_type: String,
        /// Calendar date in YYYY-MM-DD form.
        date: String,
    },

    /// Print all readings for one device/date, across all of its sensors.
    Device {
        device_id: String,
        /// Calendar date in YYYY-MM-DD form.
        date: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => run_server(&config).await,
        Commands::Sensor {
            device_id,
            sensor_type,
            date,
        } => {
            let engine = QueryEngine::new(Arc::new(S3Store::new(config.storage.clone())?));
            print_result(engine.get_sensor_data(&device_id, &sensor_type, &date).await)
        }
        Commands::Device { device_id, date } => {
            let engine = QueryEngine::new(Arc::new(S3Store::new(config.storage.clone())?));
            print_result(engine.get_device_data(&device_id, &date).await)
        }
    }
}

fn print_result(result: Result<Vec<weathervane::models::SensorReading>, QueryError>) -> Result<()> {
    match result {
        Ok(readings) => {
            println!("{}", serde_json::to_string_pretty(&readings)?);
            Ok(())
        }
        Err(QueryError::NotFound(msg)) => {
            eprintln!("Data Not Found: {}", msg);
            std::process::exit(1);
        }
        Err(QueryError::Internal(msg)) => {
            eprintln!("Error: {}", msg);
            std::process::exit(2);
        }
    }
}

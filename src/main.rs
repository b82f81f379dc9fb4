mod api;
mod error;
mod models;
mod weather;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::client::OpenWeatherClient;
use crate::weather::backup::{self, BackupStore};
use crate::weather::service::WeatherService;
use crate::weather::WeatherConfig;

#[derive(Parser)]
#[command(name = "weather-advisor", about = "City weather forecasts with practical advice")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = weather::CONFIG_FILE)]
    config: PathBuf,
    /// Serve from the backup file only, never call the provider
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get the forecast advisory for a city
    Advice {
        /// City name, e.g. "London" or "London,GB"
        city: String,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Inspect or maintain the backup file
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List backed up cities
    List,
    /// Remove forecast slots that are already in the past
    Prune,
    /// Remove one city from the backup
    Clear {
        /// City name as stored (case-sensitive)
        city: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_advisor=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env if present (override system env vars)
    dotenvy::dotenv_override().ok();

    let cli = Cli::parse();
    let mut config = WeatherConfig::load(&cli.config)?;
    if cli.offline {
        config.online = false;
    }

    match cli.command {
        Commands::Advice { city, pretty } => {
            let client = OpenWeatherClient::new(&config)?;
            let service = Arc::new(WeatherService::from_config(client, &config));
            if !service.is_online() {
                info!("Offline mode, answering from {}", config.cache_file_path.display());
            }
            let result = service.get_advisory(&city).await;

            let json = if pretty {
                serde_json::to_string_pretty(&result)
            } else {
                serde_json::to_string(&result)
            }
            .context("Failed to serialize advisory")?;
            println!("{}", json);

            let status = result.http_status();
            if result.data.is_empty() {
                info!("Advisory for {} finished with status {}: {}", city, status, result.message);
            } else {
                let days: Vec<&str> = result.data.dates().collect();
                info!(
                    "Advisory for {} finished with status {} ({} days: {})",
                    city,
                    status,
                    result.data.len(),
                    days.join(", ")
                );
                for (date, slots) in result.data.iter() {
                    debug!("{}: {} slots", date, slots.len());
                }
            }
            Ok(ExitCode::from(exit_code(status)))
        }
        Commands::Cache { action } => {
            let store = BackupStore::new(&config.cache_file_path);
            let _guard = store.lock().await;
            let mut index = store.load();

            match action {
                CacheCommands::List => {
                    if index.is_empty() {
                        println!("Backup {} is empty", store.path().display());
                    }
                    for (city, bundle) in &index {
                        let first = bundle.list.first().map(|r| r.dt_txt.as_str()).unwrap_or("--");
                        let last = bundle.list.last().map(|r| r.dt_txt.as_str()).unwrap_or("--");
                        println!("{:<24} {:>3} slots  {} .. {}", city, bundle.cnt, first, last);
                    }
                }
                CacheCommands::Prune => {
                    let removed = backup::prune_all(&mut index, Utc::now());
                    store.save(&index)?;
                    println!("Pruned {} expired slots, {} cities remain", removed, index.len());
                }
                CacheCommands::Clear { city } => {
                    if backup::remove(&mut index, &city).is_some() {
                        store.save(&index)?;
                        println!("Removed {} from backup", city);
                    } else {
                        println!("{} is not in the backup", city);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 200 -> 0, 404 -> 4, everything else (served as 503) -> 5
fn exit_code(http_status: u16) -> u8 {
    match http_status {
        200 => 0,
        404 => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_advice() {
        let cli = Cli::try_parse_from(["weather-advisor", "--offline", "advice", "New York"]).unwrap();
        assert!(cli.offline);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        match cli.command {
            Commands::Advice { city, pretty } => {
                assert_eq!(city, "New York");
                assert!(!pretty);
            }
            _ => panic!("expected advice command"),
        }
    }

    #[test]
    fn test_cli_parses_cache_clear() {
        let cli = Cli::try_parse_from(["weather-advisor", "cache", "clear", "Paris", "-c", "alt.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(
            cli.command,
            Commands::Cache { action: CacheCommands::Clear { ref city } } if city == "Paris"
        ));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(200), 0);
        assert_eq!(exit_code(404), 4);
        assert_eq!(exit_code(503), 5);
    }
}

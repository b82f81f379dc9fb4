pub mod advice;
pub mod aggregator;
pub mod backup;
pub mod service;
pub mod timezone;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::api::endpoints;

pub const CONFIG_FILE: &str = "config.toml";

/// Weather configuration loaded from the `[weather]` table of config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; usually supplied through OPENWEATHER_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Number of 3-hour slots to request (max 40, five days)
    #[serde(default = "default_record_count")]
    pub record_count: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_path")]
    pub provider_path: String,
    /// When false every request is served from the backup file only
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default = "default_cache_file")]
    pub cache_file_path: PathBuf,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            record_count: default_record_count(),
            base_url: default_base_url(),
            provider_path: default_provider_path(),
            online: true,
            cache_file_path: default_cache_file(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_true() -> bool { true }
fn default_record_count() -> u32 { 40 }
fn default_base_url() -> String { endpoints::OPENWEATHER_API.to_string() }
fn default_provider_path() -> String { endpoints::FORECAST.to_string() }
fn default_cache_file() -> PathBuf { PathBuf::from("weather_backup.json") }
fn default_request_timeout() -> u64 { 15 }

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    weather: WeatherConfig,
}

impl WeatherConfig {
    /// Load from a TOML file (defaults when it does not exist), then apply
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            Self::from_toml(&data)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        info!(
            "Weather config: online={} count={} cache={}",
            config.online,
            config.record_count,
            config.cache_file_path.display()
        );
        Ok(config)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(data)?;
        Ok(file.weather)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = var("OPENWEATHER_API_KEY").filter(|s| !s.is_empty()) {
            self.api_key = key;
        }
        if let Some(online) = var("WEATHER_ONLINE").filter(|s| !s.is_empty()) {
            self.online = parse_flag(&online)
                .with_context(|| format!("WEATHER_ONLINE must be true or false, got {:?}", online))?;
        }
        if let Some(path) = var("WEATHER_CACHE_FILE").filter(|s| !s.is_empty()) {
            self.cache_file_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn forecast_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.provider_path.trim_start_matches('/')
        )
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

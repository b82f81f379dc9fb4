use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{endpoints, ForecastProvider};
use crate::error::ProviderError;
use crate::models::forecast::{CityForecastBundle, SUCCESS_CODE};
use crate::weather::WeatherConfig;

/// OpenWeatherMap forecast client
pub struct OpenWeatherClient {
    http: Client,
    forecast_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            warn!("No OpenWeatherMap API key configured, requests will be rejected");
        }

        let http = Client::builder()
            .user_agent("weather-advisor/0.1.0")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            forecast_url: config.forecast_url(),
            api_key: config.api_key.clone(),
        })
    }
}

impl ForecastProvider for OpenWeatherClient {
    async fn fetch(&self, city: &str, count: u32) -> Result<CityForecastBundle, ProviderError> {
        debug!("Fetching forecast for {} ({} slots): {}", city, count, self.forecast_url);

        let count = count.to_string();
        let response = self
            .http
            .get(&self.forecast_url)
            .query(&[
                (endpoints::PARAM_QUERY, city),
                (endpoints::PARAM_COUNT, count.as_str()),
                (endpoints::PARAM_APP_ID, self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return match serde_json::from_str::<CityForecastBundle>(&body) {
                Ok(details) if !details.cod.is_empty() => {
                    warn!("Client error for {}: {} - {}", city, details.cod, details.message);
                    Err(ProviderError::Client {
                        status: details.cod,
                        message: details.message,
                    })
                }
                _ => {
                    error!("Unexpected error with status code: {}", status.as_u16());
                    Err(ProviderError::Transport(format!(
                        "Unexpected error with status code: {}",
                        status.as_u16()
                    )))
                }
            };
        }

        if !status.is_success() {
            error!("Unexpected error with status code: {}", status.as_u16());
            return Err(ProviderError::Transport(format!(
                "Unexpected error with status code: {}",
                status.as_u16()
            )));
        }

        let bundle: CityForecastBundle = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("Failed to parse forecast response: {}", e)))?;

        if bundle.cod != SUCCESS_CODE {
            warn!("Provider reported {} for {}: {}", bundle.cod, city, bundle.message);
            return Err(ProviderError::Client {
                status: bundle.cod,
                message: bundle.message,
            });
        }

        info!("Fetched {} forecast slots for {}", bundle.list.len(), city);
        Ok(bundle)
    }
}

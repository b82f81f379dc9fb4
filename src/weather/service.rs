use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::ForecastProvider;
use crate::error::ProviderError;
use crate::models::advisory::CityAdvisoryResult;
use crate::models::forecast::CityForecastBundle;

use super::aggregator;
use super::backup::{self, BackupIndex, BackupStore};
use super::WeatherConfig;

pub const CITY_NOT_FOUND: &str = "city not found";

/// Entry point for city advisories: live forecast first, backup file second.
pub struct WeatherService<P> {
    provider: P,
    store: BackupStore,
    online: bool,
    record_count: u32,
}

impl<P: ForecastProvider + 'static> WeatherService<P> {
    pub fn new(provider: P, store: BackupStore, online: bool, record_count: u32) -> Self {
        Self {
            provider,
            store,
            online,
            record_count,
        }
    }

    pub fn from_config(provider: P, config: &WeatherConfig) -> Self {
        Self::new(
            provider,
            BackupStore::new(&config.cache_file_path),
            config.online,
            config.record_count,
        )
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Build the advisory for `city`.
    ///
    /// The work runs on its own task: if the caller stops waiting, the
    /// provider call and any backup write still finish.
    pub async fn get_advisory(self: &Arc<Self>, city: &str) -> CityAdvisoryResult {
        let service = Arc::clone(self);
        let city = city.trim().to_string();
        let task = tokio::spawn(async move { service.resolve(&city).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Advisory task failed: {}", e);
                CityAdvisoryResult::unavailable()
            }
        }
    }

    async fn resolve(&self, city: &str) -> CityAdvisoryResult {
        if city.is_empty() {
            return CityAdvisoryResult::empty(CITY_NOT_FOUND, 404);
        }

        let index = {
            let _guard = self.store.lock().await;
            self.store.load()
        };

        if !self.online {
            info!("Service is in offline mode. Fetching {} from backup.", city);
            return match backup::get(&index, city) {
                Some(cached) => advise(cached),
                None => {
                    info!("No data available for {} in backup.", city);
                    CityAdvisoryResult::empty(format!("No data available currently for {}", city), 503)
                }
            };
        }

        match self.provider.fetch(city, self.record_count).await {
            Ok(bundle) if bundle.is_usable() => {
                let result = advise(&bundle);
                self.persist(|index| backup::put(index, city, bundle)).await;
                result
            }
            Ok(bundle) => {
                warn!("Provider returned no forecast slots for {} (cod={})", city, bundle.cod);
                self.from_backup(&index, city)
                    .await
                    .unwrap_or_else(CityAdvisoryResult::unavailable)
            }
            Err(ProviderError::Client { status, message }) => {
                warn!("Error getting weather data for {}: {} - {}", city, status, message);
                self.from_backup(&index, city)
                    .await
                    .unwrap_or_else(|| CityAdvisoryResult::empty(message, parse_status(&status)))
            }
            Err(e @ ProviderError::Transport(_)) => {
                error!("Error fetching weather data for {}: {}", city, e);
                self.from_backup(&index, city)
                    .await
                    .unwrap_or_else(CityAdvisoryResult::unavailable)
            }
        }
    }

    /// Serve `city` from the backup after a failed fetch. Expired slots are
    /// pruned first and the city's entry in the file is pruned to match.
    async fn from_backup(&self, index: &BackupIndex, city: &str) -> Option<CityAdvisoryResult> {
        let cached = backup::get(index, city)?;
        let now = Utc::now();
        let pruned = backup::prune_expired(cached, now);
        let expired = cached.list.len() - pruned.list.len();

        if expired == 0 {
            info!("Serving {} from backup", city);
            return Some(advise(&pruned));
        }

        self.persist(|index| backup::prune_city(index, city, now)).await;

        if pruned.list.is_empty() {
            info!("Backup for {} has only expired slots, dropped it", city);
            return None;
        }

        info!("Serving {} from backup, {} expired slots pruned", city, expired);
        Some(advise(&pruned))
    }

    /// Apply a single-city change to the current backup file
    async fn persist<F>(&self, change: F)
    where
        F: FnOnce(&mut BackupIndex) -> bool,
    {
        if let Err(e) = self.store.update(change).await {
            warn!("Failed to update backup file: {}", e);
        }
    }
}

fn advise(bundle: &CityForecastBundle) -> CityAdvisoryResult {
    aggregator::aggregate(bundle).unwrap_or_else(|e| {
        error!("Failed to build advisory: {}", e);
        CityAdvisoryResult::unavailable()
    })
}

/// Provider status text to a result status; anything unusable becomes 503
fn parse_status(status: &str) -> u16 {
    status
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|s| (100..600).contains(s))
        .unwrap_or(503)
}

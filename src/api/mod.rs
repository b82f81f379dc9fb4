pub mod client;
pub mod endpoints;

use std::future::Future;

use crate::error::ProviderError;
use crate::models::forecast::CityForecastBundle;

/// Source of raw city forecasts.
///
/// Implementations make a single attempt per call; retries are not part of
/// the contract.
pub trait ForecastProvider: Send + Sync {
    fn fetch(
        &self,
        city: &str,
        count: u32,
    ) -> impl Future<Output = Result<CityForecastBundle, ProviderError>> + Send;
}

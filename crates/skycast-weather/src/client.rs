//! OpenWeatherMap current-conditions and forecast client.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use skycast_core::WeatherConfig;
use tracing::instrument;

use crate::error::WeatherError;
use crate::fallback;
use crate::payload::{validate_current, validate_forecast, RawCurrentResponse, RawForecastResponse};
use crate::retry::{with_retry, RetryConfig};
use crate::types::{Coordinates, CurrentWeather, DataSource, ForecastFetch, LocationQuery};

pub const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
    offline_fallback: bool,
}

impl WeatherClient {
    pub fn new(api_key: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: api_key.trim().to_string(),
            base_url: OPENWEATHER_API_BASE.to_string(),
            retry: RetryConfig::default(),
            offline_fallback: true,
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let key = if config.has_api_key() {
            config.api_key.as_str()
        } else {
            ""
        };
        Ok(Self::new(key)?
            .with_base_url(&config.base_url)
            .with_offline_fallback(config.offline_fallback))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
        self.offline_fallback = enabled;
        self
    }

    /// Current conditions for a city name.
    #[instrument(skip(self), level = "info")]
    pub async fn current_by_city(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        self.current(&LocationQuery::City(city.to_string())).await
    }

    /// Current conditions for a map-selected point.
    #[instrument(skip(self), level = "info")]
    pub async fn current_by_coords(
        &self,
        coords: Coordinates,
    ) -> Result<CurrentWeather, WeatherError> {
        self.current(&LocationQuery::Point(coords)).await
    }

    /// 5-day / 3-hour forecast for a city name.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_by_city(&self, city: &str) -> Result<ForecastFetch, WeatherError> {
        self.forecast(&LocationQuery::City(city.to_string())).await
    }

    /// 5-day / 3-hour forecast for a map-selected point.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_by_coords(
        &self,
        coords: Coordinates,
    ) -> Result<ForecastFetch, WeatherError> {
        self.forecast(&LocationQuery::Point(coords)).await
    }

    pub async fn current(&self, query: &LocationQuery) -> Result<CurrentWeather, WeatherError> {
        let raw: RawCurrentResponse = self.get_json("weather", query).await?;
        let current = validate_current(raw, DataSource::Live).map_err(WeatherError::InvalidPayload)?;
        tracing::info!(
            "Current weather for {}: {}°C, {}",
            query,
            current.temperature_c,
            current.condition.description
        );
        Ok(current)
    }

    pub async fn forecast(&self, query: &LocationQuery) -> Result<ForecastFetch, WeatherError> {
        let raw: RawForecastResponse = self.get_json("forecast", query).await?;
        let fetch = validate_forecast(raw, DataSource::Live);
        tracing::info!("Forecast for {}: {} samples", query, fetch.samples.len());
        Ok(fetch)
    }

    /// Current conditions, or sample data when the provider is unavailable
    /// and fallback is enabled. Unknown locations are always reported.
    pub async fn current_or_fallback(
        &self,
        query: &LocationQuery,
    ) -> Result<CurrentWeather, WeatherError> {
        match self.current(query).await {
            Err(e) if self.offline_fallback && e.allows_fallback() => {
                tracing::warn!("Using sample current weather for {}: {}", query, e);
                Ok(fallback::sample_current(&query.to_string()))
            }
            other => other,
        }
    }

    /// Forecast, or a sample forecast starting at `today` when the provider
    /// is unavailable and fallback is enabled.
    pub async fn forecast_or_fallback(
        &self,
        query: &LocationQuery,
        today: NaiveDate,
    ) -> Result<ForecastFetch, WeatherError> {
        match self.forecast(query).await {
            Err(e) if self.offline_fallback && e.allows_fallback() => {
                tracing::warn!("Using sample forecast for {}: {}", query, e);
                Ok(fallback::sample_forecast(today))
            }
            other => other,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &LocationQuery,
    ) -> Result<T, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::MissingApiKey);
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        let mut params: Vec<(&str, String)> = match query {
            LocationQuery::City(name) => vec![("q", name.trim().to_string())],
            LocationQuery::Point(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));

        let started = Utc::now();
        let response = with_retry(&self.retry, || self.client.get(&url).query(&params).send()).await?;
        tracing::debug!(
            "GET {} -> {} in {} ms",
            endpoint,
            response.status(),
            (Utc::now() - started).num_milliseconds()
        );

        handle_response(response, query).await
    }
}

/// Map provider responses onto typed errors.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    query: &LocationQuery,
) -> Result<T, WeatherError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| WeatherError::InvalidPayload(format!("JSON parse error: {}", e)));
    }

    match status.as_u16() {
        401 => Err(WeatherError::InvalidApiKey),
        404 => Err(WeatherError::LocationNotFound(query.to_string())),
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            Err(WeatherError::RateLimited(retry_after))
        }
        code => {
            let text = response.text().await.unwrap_or_default();
            Err(WeatherError::Api {
                status: code,
                message: text,
            })
        }
    }
}

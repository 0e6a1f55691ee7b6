//! City search and reverse geocoding via the OpenWeatherMap Geo API.
//!
//! A small built-in city list answers lookups when the API is unreachable.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use skycast_core::WeatherConfig;
use tracing::instrument;

use crate::client::handle_response;
use crate::error::WeatherError;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{CitySuggestion, Coordinates, LocationQuery};

pub const OPENWEATHER_GEO_BASE: &str = "https://api.openweathermap.org/geo/1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Shortest query worth sending.
pub const MIN_QUERY_LEN: usize = 2;

/// Suggestions shown for an empty query.
const DEFAULT_SUGGESTIONS: usize = 6;

struct KnownCity {
    name: &'static str,
    country: &'static str,
    state: Option<&'static str>,
    lat: f64,
    lon: f64,
}

const KNOWN_CITIES: &[KnownCity] = &[
    KnownCity { name: "Tunis", country: "TN", state: None, lat: 36.8, lon: 10.18 },
    KnownCity { name: "Paris", country: "FR", state: None, lat: 48.85, lon: 2.35 },
    KnownCity { name: "London", country: "GB", state: None, lat: 51.51, lon: -0.13 },
    KnownCity { name: "New York", country: "US", state: Some("NY"), lat: 40.71, lon: -74.01 },
    KnownCity { name: "Tokyo", country: "JP", state: None, lat: 35.68, lon: 139.69 },
    KnownCity { name: "Dubai", country: "AE", state: None, lat: 25.27, lon: 55.29 },
    KnownCity { name: "Sydney", country: "AU", state: None, lat: -33.87, lon: 151.21 },
    KnownCity { name: "Berlin", country: "DE", state: None, lat: 52.52, lon: 13.41 },
    KnownCity { name: "Rome", country: "IT", state: None, lat: 41.9, lon: 12.5 },
    KnownCity { name: "Madrid", country: "ES", state: None, lat: 40.42, lon: -3.7 },
    KnownCity { name: "Cairo", country: "EG", state: None, lat: 30.04, lon: 31.24 },
    KnownCity { name: "Moscow", country: "RU", state: None, lat: 55.75, lon: 37.62 },
    KnownCity { name: "Bangkok", country: "TH", state: None, lat: 13.75, lon: 100.5 },
    KnownCity { name: "Seoul", country: "KR", state: None, lat: 37.57, lon: 126.98 },
    KnownCity { name: "Mumbai", country: "IN", state: None, lat: 19.08, lon: 72.88 },
    KnownCity { name: "Istanbul", country: "TR", state: None, lat: 41.01, lon: 28.98 },
];

impl From<&KnownCity> for CitySuggestion {
    fn from(c: &KnownCity) -> Self {
        CitySuggestion {
            name: c.name.to_string(),
            country: c.country.to_string(),
            state: c.state.map(str::to_string),
            coordinates: Coordinates::new(c.lat, c.lon),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    name: String,
    #[serde(default)]
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<GeoEntry> for CitySuggestion {
    fn from(e: GeoEntry) -> Self {
        CitySuggestion {
            name: e.name,
            country: e.country,
            state: e.state,
            coordinates: Coordinates::new(e.lat, e.lon),
        }
    }
}

/// Prefix match over the built-in city list, case-insensitive.
/// An empty query returns the first few cities.
pub fn suggest_offline(query: &str) -> Vec<CitySuggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return KNOWN_CITIES
            .iter()
            .take(DEFAULT_SUGGESTIONS)
            .map(CitySuggestion::from)
            .collect();
    }

    KNOWN_CITIES
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with(&query))
        .map(CitySuggestion::from)
        .collect()
}

/// Exact (case-insensitive) match in the built-in city list.
pub fn find_offline(name: &str) -> Option<CitySuggestion> {
    let name = name.trim();
    KNOWN_CITIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(CitySuggestion::from)
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

impl GeocodingClient {
    pub fn new(api_key: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: api_key.trim().to_string(),
            base_url: OPENWEATHER_GEO_BASE.to_string(),
            retry: RetryConfig::default(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let key = if config.has_api_key() {
            config.api_key.as_str()
        } else {
            ""
        };
        Ok(Self::new(key)?.with_base_url(&config.geo_url))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Cities matching `query`, at most `limit`.
    ///
    /// Queries shorter than two characters return nothing without a request.
    #[instrument(skip(self), level = "info")]
    pub async fn search_cities(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CitySuggestion>, WeatherError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let params = vec![
            ("q", query.to_string()),
            ("limit", limit.max(1).to_string()),
        ];
        let entries: Vec<GeoEntry> = self
            .get_json("direct", params, &LocationQuery::City(query.to_string()))
            .await?;

        Ok(entries.into_iter().map(CitySuggestion::from).collect())
    }

    /// Suggestions from the API, or from the built-in list when it fails.
    pub async fn suggest(&self, query: &str, limit: u32) -> Vec<CitySuggestion> {
        match self.search_cities(query, limit).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("City search failed, using built-in list: {}", e);
                suggest_offline(query)
                    .into_iter()
                    .take(limit as usize)
                    .collect()
            }
        }
    }

    /// Canonical city for user input: the first API match, or an exact
    /// built-in match when the API is unreachable.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve_city(&self, query: &str) -> Result<CitySuggestion, WeatherError> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Err(WeatherError::LocationNotFound(trimmed.to_string()));
        }

        match self.search_cities(trimmed, 1).await {
            Ok(found) => found
                .into_iter()
                .next()
                .ok_or_else(|| WeatherError::LocationNotFound(trimmed.to_string())),
            Err(e) if e.allows_fallback() => {
                tracing::warn!("Geocoding unavailable, checking built-in list: {}", e);
                find_offline(trimmed).ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Place name for a map-selected point, e.g. "Tunis, TN".
    #[instrument(skip(self), level = "info")]
    pub async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<CitySuggestion>, WeatherError> {
        let params = vec![
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("limit", "1".to_string()),
        ];
        let entries: Vec<GeoEntry> = self
            .get_json("reverse", params, &LocationQuery::Point(coords))
            .await?;

        let place = entries.into_iter().next().map(CitySuggestion::from);
        if let Some(p) = &place {
            tracing::info!("Reverse geocoded to: {}", p.display_name());
        }
        Ok(place)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        mut params: Vec<(&str, String)>,
        query: &LocationQuery,
    ) -> Result<T, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::MissingApiKey);
        }
        params.push(("appid", self.api_key.clone()));

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = with_retry(&self.retry, || self.client.get(&url).query(&params).send()).await?;
        handle_response(response, query).await
    }
}

//! Weather data for SkyCast
//!
//! Fetches current conditions and the 5-day/3-hour forecast from
//! OpenWeatherMap, validates the raw payloads, and normalizes the forecast
//! into a 7-day summary and a 24-point hourly series per day.

pub mod client;
pub mod error;
pub mod fallback;
pub mod format;
pub mod geocode;
pub mod normalize;
pub mod payload;
pub mod retry;
pub mod tips;
pub mod types;

pub use client::WeatherClient;
pub use error::WeatherError;
pub use geocode::GeocodingClient;
pub use normalize::{group_by_day, interpolate_hours, ForecastView};
pub use retry::RetryConfig;
pub use tips::{lifestyle_tips, Tip, TipCategory};
pub use types::*;

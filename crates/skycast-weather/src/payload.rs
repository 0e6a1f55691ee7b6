//! Raw OpenWeatherMap payloads and their validation into domain types.
//!
//! Every field the provider may omit is optional here; the conversion
//! functions decide what is defaulted and what rejects an entry.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::format::{ms_to_kmh, round_display};
use crate::types::{
    CityInfo, ConditionInfo, Coordinates, CurrentWeather, DataSource, ForecastFetch,
    ForecastSample,
};

#[derive(Debug, Deserialize)]
pub struct RawForecastResponse {
    #[serde(default)]
    pub list: Vec<RawForecastEntry>,
    pub city: Option<RawCity>,
}

#[derive(Debug, Deserialize)]
pub struct RawForecastEntry {
    pub dt_txt: Option<String>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
}

#[derive(Debug, Deserialize)]
pub struct RawMain {
    pub temp: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawCondition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct RawWind {
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct RawCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub coord: Option<RawCoord>,
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Deserialize)]
pub struct RawSys {
    #[serde(default)]
    pub country: String,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawCurrentResponse {
    #[serde(default)]
    pub name: String,
    pub coord: Option<RawCoord>,
    pub sys: Option<RawSys>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub visibility: Option<u32>,
    #[serde(default)]
    pub timezone: i32,
}

impl From<RawCoord> for Coordinates {
    fn from(c: RawCoord) -> Self {
        Coordinates::new(c.lat, c.lon)
    }
}

impl From<RawCity> for CityInfo {
    fn from(c: RawCity) -> Self {
        CityInfo {
            name: c.name,
            country: c.country,
            coordinates: c.coord.map(Coordinates::from),
            timezone_offset_secs: c.timezone,
        }
    }
}

/// Why a forecast entry was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleRejection {
    MissingTimestamp,
    MissingTemperature,
}

impl TryFrom<RawForecastEntry> for ForecastSample {
    type Error = SampleRejection;

    fn try_from(entry: RawForecastEntry) -> Result<Self, Self::Error> {
        let timestamp = entry
            .dt_txt
            .filter(|t| !t.trim().is_empty())
            .ok_or(SampleRejection::MissingTimestamp)?;
        let main = entry.main.ok_or(SampleRejection::MissingTemperature)?;
        let temperature = main.temp.ok_or(SampleRejection::MissingTemperature)?;

        // A missing wind block is normal for some providers and means calm.
        let (speed_ms, degrees) = entry
            .wind
            .map(|w| (w.speed.unwrap_or(0.0), w.deg.unwrap_or(0.0)))
            .unwrap_or((0.0, 0.0));

        let condition = entry.weather.into_iter().next();
        let (icon, description) = condition
            .map(|c| (c.icon, c.description))
            .unwrap_or_default();

        Ok(ForecastSample::new(timestamp, temperature)
            .with_humidity(main.humidity.unwrap_or(0.0))
            .with_wind(ms_to_kmh(speed_ms), degrees)
            .with_icon(icon, description))
    }
}

/// Validate a forecast response. Bad entries are skipped, never fatal.
pub fn validate_forecast(raw: RawForecastResponse, source: DataSource) -> ForecastFetch {
    let total = raw.list.len();
    let samples: Vec<ForecastSample> = raw
        .list
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match ForecastSample::try_from(entry) {
            Ok(sample) => {
                if sample.time.is_none() {
                    tracing::debug!(
                        "Forecast entry {} has malformed timestamp {:?}",
                        index,
                        sample.timestamp
                    );
                }
                Some(sample)
            }
            Err(reason) => {
                tracing::debug!("Skipping forecast entry {}: {:?}", index, reason);
                None
            }
        })
        .collect();

    if samples.len() < total {
        tracing::warn!(
            "Dropped {} of {} forecast entries during validation",
            total - samples.len(),
            total
        );
    }

    ForecastFetch {
        city: raw.city.map(CityInfo::from),
        samples,
        fetched_at: Utc::now(),
        source,
    }
}

/// Validate a current-weather response. A missing temperature is fatal.
pub fn validate_current(
    raw: RawCurrentResponse,
    source: DataSource,
) -> Result<CurrentWeather, String> {
    let main = raw.main.ok_or("current weather has no `main` block")?;
    let temperature = main.temp.ok_or("current weather has no temperature")?;
    let (sunrise, sunset, country) = match raw.sys {
        Some(sys) => (
            sys.sunrise.and_then(|ts| local_clock(ts, raw.timezone)),
            sys.sunset.and_then(|ts| local_clock(ts, raw.timezone)),
            sys.country,
        ),
        None => (None, None, String::new()),
    };

    let condition = raw
        .weather
        .into_iter()
        .next()
        .map(|c| ConditionInfo {
            main: c.main,
            description: c.description,
            icon: c.icon,
        })
        .unwrap_or_default();

    let wind_ms = raw.wind.and_then(|w| w.speed).unwrap_or(0.0);

    Ok(CurrentWeather {
        name: raw.name,
        country,
        coordinates: raw.coord.map(Coordinates::from),
        temperature_c: round_display(temperature),
        temp_min_c: round_display(main.temp_min.unwrap_or(temperature)),
        temp_max_c: round_display(main.temp_max.unwrap_or(temperature)),
        humidity_pct: round_display(main.humidity.unwrap_or(0.0)),
        wind_speed_kmh: round_display(ms_to_kmh(wind_ms)),
        condition,
        visibility_m: raw.visibility,
        sunrise,
        sunset,
        source,
    })
}

/// `HH:MM` wall-clock time of a unix timestamp at a UTC offset in seconds.
fn local_clock(timestamp: i64, offset_secs: i32) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp + i64::from(offset_secs), 0)
        .map(|t| t.format("%H:%M").to_string())
}

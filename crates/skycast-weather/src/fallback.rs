//! Built-in sample data shown when the provider cannot be reached.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike, Utc};

use crate::format::is_night;
use crate::types::{
    ConditionInfo, CurrentWeather, DataSource, ForecastFetch, ForecastSample, TIMESTAMP_FORMAT,
};

/// 5 days of 3-hour samples.
pub const SAMPLE_FORECAST_LEN: usize = 40;

const BASE_TEMP_C: f64 = 16.0;
const DAILY_SWING_C: f64 = 6.0;

/// Mild clear-sky conditions labelled with the requested city.
pub fn sample_current(city: &str) -> CurrentWeather {
    CurrentWeather {
        name: city.trim().to_string(),
        country: String::new(),
        coordinates: None,
        temperature_c: 18,
        temp_min_c: 14,
        temp_max_c: 22,
        humidity_pct: 65,
        wind_speed_kmh: 12,
        condition: ConditionInfo {
            main: "Clear".to_string(),
            description: "clear sky".to_string(),
            icon: "01n".to_string(),
        },
        visibility_m: Some(10_000),
        sunrise: Some("06:45".to_string()),
        sunset: Some("17:30".to_string()),
        source: DataSource::Sample,
    }
}

/// Forecast starting at midnight of `start`, warmest around noon.
pub fn sample_forecast(start: NaiveDate) -> ForecastFetch {
    let midnight = start.and_time(NaiveTime::default());

    let samples = (0..SAMPLE_FORECAST_LEN)
        .map(|i| {
            let time = midnight + Duration::hours(3 * i as i64);
            let hour = time.hour();
            let variation =
                ((f64::from(hour) - 6.0) * std::f64::consts::PI / 12.0).sin() * DAILY_SWING_C;
            // Fixed jitter so repeated runs render identically.
            let jitter = (i % 5) as f64 * 0.4;
            let icon = if is_night(hour) {
                "01n"
            } else if (12..=15).contains(&hour) {
                "02d"
            } else {
                "01d"
            };

            ForecastSample::new(
                time.format(TIMESTAMP_FORMAT).to_string(),
                BASE_TEMP_C + variation + jitter,
            )
            .with_humidity(65.0 - variation * 3.0)
            .with_wind(12.0, 180.0)
            .with_icon(icon, if icon == "02d" { "few clouds" } else { "clear sky" })
        })
        .collect();

    ForecastFetch {
        city: None,
        samples,
        fetched_at: Utc::now(),
        source: DataSource::Sample,
    }
}

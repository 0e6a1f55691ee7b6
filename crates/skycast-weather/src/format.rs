//! Display formatting: rounding, unit conversion, labels.
//!
//! Everything upstream of this module is metric (Celsius, km/h).

use skycast_core::TemperatureUnit;

use crate::types::WeatherCondition;

/// Round to the nearest integer with halves going up (-2.5 -> -2, 2.5 -> 3).
pub fn round_display(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh / 1.609_344
}

/// Convert a provider wind speed (m/s) to km/h.
pub fn ms_to_kmh(ms: f64) -> f64 {
    ms * 3.6
}

/// Render a Celsius value in the requested unit, e.g. `"61°F"`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let value = match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
    };
    format!("{}{}", round_display(value), unit.suffix())
}

/// Render a km/h value; Fahrenheit users get mph.
pub fn format_wind(kmh: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{} km/h", round_display(kmh)),
        TemperatureUnit::Fahrenheit => format!("{} mph", round_display(kmh_to_mph(kmh))),
    }
}

/// Chart label for an hour of day, `"07:00"`.
pub fn format_hour(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Night runs from 19:00 to 05:59.
pub fn is_night(hour: u32) -> bool {
    hour >= 19 || hour < 6
}

/// Emoji for a condition group name; unknown groups get a generic icon.
pub fn condition_emoji(main: &str) -> &'static str {
    if main.trim().is_empty() {
        return "❓";
    }
    WeatherCondition::from_main(main).emoji()
}

//! Plain-text rendering for the terminal.

use std::collections::HashMap;

use skycast_core::TemperatureUnit;
use skycast_locations::SavedLocation;
use skycast_weather::format::{
    condition_emoji, format_hour, format_temperature, format_wind, is_night,
};
use skycast_weather::{
    CitySuggestion, CurrentWeather, DataSource, ForecastView, Tip, WeatherCondition,
};

fn icon_emoji(icon_code: Option<&str>) -> &'static str {
    match icon_code {
        Some(code) if !code.is_empty() => WeatherCondition::from_icon_code(code).emoji(),
        _ => "·",
    }
}

/// Join lines, each terminated by a newline.
fn block(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

pub fn current(weather: &CurrentWeather, label: &str, unit: TemperatureUnit, favorite: bool) -> String {
    let star = if favorite { " ★" } else { "" };
    let mut lines = vec![format!("{}{}", label, star)];
    if weather.source == DataSource::Sample {
        lines.push("(offline sample data)".to_string());
    }

    lines.push(format!(
        "{} {}  {}",
        condition_emoji(&weather.condition.main),
        format_temperature(f64::from(weather.temperature_c), unit),
        weather.condition.description
    ));
    lines.push(format!(
        "Low {}  High {}  Humidity {}%  Wind {}",
        format_temperature(f64::from(weather.temp_min_c), unit),
        format_temperature(f64::from(weather.temp_max_c), unit),
        weather.humidity_pct,
        format_wind(f64::from(weather.wind_speed_kmh), unit)
    ));
    if let (Some(rise), Some(set)) = (&weather.sunrise, &weather.sunset) {
        lines.push(format!("Sunrise {}  Sunset {}", rise, set));
    }
    block(lines)
}

pub fn tips(tips: &[Tip]) -> String {
    block(
        tips.iter()
            .map(|tip| format!("{} {}", tip.category.emoji(), tip.text))
            .collect(),
    )
}

pub fn days(view: &ForecastView, unit: TemperatureUnit) -> String {
    let lines = view
        .days
        .iter()
        .map(|day| {
            let marker = if day.date_key == view.selected_day { ">" } else { " " };
            let label = if day.is_today { "Today" } else { day.day_label.as_str() };
            let temp = day
                .average_temperature
                .map(|t| format_temperature(f64::from(t), unit))
                .unwrap_or_else(|| "--".to_string());
            format!(
                "{} {:<5} {}  {} {:>5}",
                marker,
                label,
                day.date_key,
                icon_emoji(day.dominant_icon_code.as_deref()),
                temp
            )
        })
        .collect();
    block(lines)
}

pub fn hourly(view: &ForecastView, unit: TemperatureUnit) -> String {
    if !view.has_hourly() {
        return format!("No hourly forecast for {}\n", view.selected_day);
    }

    let mut lines = vec![format!("Hourly for {}", view.selected_day)];
    lines.extend(view.hourly.iter().map(|point| {
        let icon = if is_night(point.hour_of_day) && point.icon_code.ends_with('d') {
            "🌙"
        } else {
            icon_emoji(Some(&point.icon_code))
        };
        format!(
            "{}  {} {:>5}  {:>3}%  {}",
            format_hour(point.hour_of_day),
            icon,
            format_temperature(f64::from(point.temperature_c), unit),
            point.humidity_pct,
            format_wind(f64::from(point.wind_speed_kmh), unit)
        )
    }));
    block(lines)
}

pub fn suggestions(found: &[CitySuggestion]) -> String {
    if found.is_empty() {
        return "No matching cities\n".to_string();
    }
    block(
        found
            .iter()
            .map(|city| {
                format!(
                    "{}  ({:.2}, {:.2})",
                    city.display_name(),
                    city.coordinates.lat,
                    city.coordinates.lon
                )
            })
            .collect(),
    )
}

/// Saved locations grouped into favorites and the rest. Locations with an
/// entry in `weather` (keyed by id) get their current conditions appended.
pub fn locations(
    favorites: &[&SavedLocation],
    others: &[&SavedLocation],
    weather: &HashMap<String, CurrentWeather>,
    unit: TemperatureUnit,
) -> String {
    if favorites.is_empty() && others.is_empty() {
        return "No saved locations\n".to_string();
    }

    let mut lines = Vec::new();
    for (heading, group) in [("Favorites", favorites), ("Saved", others)] {
        if group.is_empty() {
            continue;
        }
        lines.push(format!("{}:", heading));
        for location in group {
            let mut line = format!(
                "  {}  {}  added {}",
                location.id,
                location.display_name(),
                location.added_at.format("%Y-%m-%d")
            );
            if let Some(now) = weather.get(&location.id) {
                line += &format!(
                    "  {} {}",
                    condition_emoji(&now.condition.main),
                    format_temperature(f64::from(now.temperature_c), unit)
                );
            }
            lines.push(line);
        }
    }
    block(lines)
}

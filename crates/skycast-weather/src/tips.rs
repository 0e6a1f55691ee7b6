//! Short advice derived from current conditions.

use serde::Serialize;

use crate::types::{CurrentWeather, WeatherCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TipCategory {
    Rain,
    Heat,
    Cold,
    Wind,
    Humidity,
    Outdoor,
    Visibility,
    General,
}

impl TipCategory {
    pub fn emoji(&self) -> &'static str {
        match self {
            TipCategory::Rain => "☂️",
            TipCategory::Heat => "💧",
            TipCategory::Cold => "🧥",
            TipCategory::Wind => "💨",
            TipCategory::Humidity => "🌫️",
            TipCategory::Outdoor => "🚴",
            TipCategory::Visibility => "🚗",
            TipCategory::General => "👍",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tip {
    pub category: TipCategory,
    pub text: String,
}

impl Tip {
    fn new(category: TipCategory, text: &str) -> Self {
        Self {
            category,
            text: text.to_string(),
        }
    }
}

const HOT_C: i32 = 30;
const COLD_C: i32 = 5;
const WINDY_KMH: i32 = 40;
const HUMID_PCT: i32 = 80;
const PLEASANT_C: std::ops::RangeInclusive<i32> = 18..=28;
const LOW_VISIBILITY_M: u32 = 1000;

/// Tips for the given conditions, in a fixed rule order.
/// Always returns at least one tip.
pub fn lifestyle_tips(current: &CurrentWeather) -> Vec<Tip> {
    let kind = current.condition.kind();
    let temp = current.temperature_c;
    let mut tips = Vec::new();

    if kind.is_wet() {
        tips.push(Tip::new(TipCategory::Rain, "Take an umbrella, rain is expected."));
    }
    if temp >= HOT_C {
        tips.push(Tip::new(TipCategory::Heat, "It's hot. Drink plenty of water and avoid the midday sun."));
    }
    if temp <= COLD_C {
        tips.push(Tip::new(TipCategory::Cold, "It's cold. Dress in warm layers."));
    }
    if current.wind_speed_kmh >= WINDY_KMH {
        tips.push(Tip::new(TipCategory::Wind, "Strong winds. Secure loose objects outside."));
    }
    if current.humidity_pct >= HUMID_PCT {
        tips.push(Tip::new(TipCategory::Humidity, "Very humid today. Expect it to feel warmer."));
    }
    if kind == WeatherCondition::Clear && PLEASANT_C.contains(&temp) {
        tips.push(Tip::new(TipCategory::Outdoor, "Great weather for an outdoor activity."));
    }
    if current.visibility_m.is_some_and(|v| v < LOW_VISIBILITY_M) {
        tips.push(Tip::new(TipCategory::Visibility, "Low visibility. Drive carefully."));
    }

    if tips.is_empty() {
        tips.push(Tip::new(TipCategory::General, "Enjoy your day!"));
    }
    tips
}

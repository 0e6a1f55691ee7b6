use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the forecast provider (`dt_txt`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Calendar day key layout (`YYYY-MM-DD`).
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Weather condition categories mapped from OpenWeatherMap groups and icons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Drizzle,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
    #[default]
    Other,
}

impl WeatherCondition {
    /// Map the provider's condition group (`weather[0].main`), case-insensitive.
    pub fn from_main(main: &str) -> Self {
        match main.trim().to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "drizzle" => Self::Drizzle,
            "rain" => Self::Rain,
            "thunderstorm" => Self::Thunderstorm,
            "snow" => Self::Snow,
            "mist" | "fog" | "haze" => Self::Mist,
            _ => Self::Other,
        }
    }

    /// Map an icon code such as `"10d"`; the day/night suffix is ignored.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_icon_code(code: &str) -> Self {
        match code.get(..2) {
            Some("01") => Self::Clear,
            Some("02" | "03" | "04") => Self::Clouds,
            Some("09") => Self::Drizzle,
            Some("10") => Self::Rain,
            Some("11") => Self::Thunderstorm,
            Some("13") => Self::Snow,
            Some("50") => Self::Mist,
            _ => Self::Other,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Cloudy",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Mist => "Mist",
            Self::Other => "Fair",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Clouds => "☁️",
            Self::Rain => "🌧️",
            Self::Drizzle => "🌦️",
            Self::Thunderstorm => "⛈️",
            Self::Snow => "❄️",
            Self::Mist => "🌫️",
            Self::Other => "🌤️",
        }
    }

    /// Conditions where an umbrella is worth carrying.
    pub fn is_wet(&self) -> bool {
        matches!(self, Self::Drizzle | Self::Rain | Self::Thunderstorm)
    }
}

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// What to fetch weather for: a city name or a map-selected point
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Point(Coordinates),
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationQuery::City(name) => write!(f, "{}", name),
            LocationQuery::Point(c) => write!(f, "{:.4}, {:.4}", c.lat, c.lon),
        }
    }
}

/// Whether data came from the provider or from built-in sample data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Sample,
}

/// Condition text and icon as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConditionInfo {
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl ConditionInfo {
    pub fn kind(&self) -> WeatherCondition {
        match WeatherCondition::from_main(&self.main) {
            WeatherCondition::Other => WeatherCondition::from_icon_code(&self.icon),
            kind => kind,
        }
    }
}

/// Current conditions, display-ready (metric, rounded)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
    pub temperature_c: i32,
    pub temp_min_c: i32,
    pub temp_max_c: i32,
    pub humidity_pct: i32,
    pub wind_speed_kmh: i32,
    pub condition: ConditionInfo,
    pub visibility_m: Option<u32>,
    /// Local sunrise time, `HH:MM`
    pub sunrise: Option<String>,
    /// Local sunset time, `HH:MM`
    pub sunset: Option<String>,
    pub source: DataSource,
}

/// City metadata attached to a forecast response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CityInfo {
    pub name: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
    /// Offset from UTC in seconds
    pub timezone_offset_secs: i32,
}

/// One validated 3-hour forecast sample.
///
/// `timestamp` keeps the provider string verbatim; `time` is its parsed
/// form and is `None` when the string is malformed. Such samples never
/// match a day and are never used for interpolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSample {
    pub timestamp: String,
    #[serde(skip)]
    pub time: Option<NaiveDateTime>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub wind_degrees: f64,
    pub icon_code: String,
    pub description: String,
}

impl ForecastSample {
    /// Create a sample with zeroed humidity/wind and no icon.
    pub fn new(timestamp: impl Into<String>, temperature_c: f64) -> Self {
        let timestamp = timestamp.into().trim().to_string();
        let time = parse_timestamp(&timestamp);
        Self {
            timestamp,
            time,
            temperature_c,
            humidity_pct: 0.0,
            wind_speed_kmh: 0.0,
            wind_degrees: 0.0,
            icon_code: String::new(),
            description: String::new(),
        }
    }

    pub fn with_humidity(mut self, humidity_pct: f64) -> Self {
        self.humidity_pct = humidity_pct;
        self
    }

    pub fn with_wind(mut self, speed_kmh: f64, degrees: f64) -> Self {
        self.wind_speed_kmh = speed_kmh;
        self.wind_degrees = degrees;
        self
    }

    pub fn with_icon(mut self, icon_code: impl Into<String>, description: impl Into<String>) -> Self {
        self.icon_code = icon_code.into();
        self.description = description.into();
        self
    }

    /// Calendar date of the sample, if its timestamp parsed.
    pub fn date(&self) -> Option<NaiveDate> {
        self.time.map(|t| t.date())
    }

    /// Date portion of the original timestamp string, up to the `' '` or
    /// `'T'` separator. `None` unless it parses as a `YYYY-MM-DD` date.
    pub fn date_key(&self) -> Option<&str> {
        self.time?;
        let key = self.timestamp.split([' ', 'T']).next()?;
        NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)
            .ok()
            .map(|_| key)
    }
}

/// Parse a provider timestamp; accepts a `T` separator as well.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Raw forecast for one fetch cycle. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFetch {
    pub city: Option<CityInfo>,
    pub samples: Vec<ForecastSample>,
    pub fetched_at: DateTime<Utc>,
    pub source: DataSource,
}

impl ForecastFetch {
    pub fn new(samples: Vec<ForecastSample>) -> Self {
        Self {
            city: None,
            samples,
            fetched_at: Utc::now(),
            source: DataSource::Live,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One day of the 7-day summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Short weekday name, e.g. "Mon"
    pub day_label: String,
    pub average_temperature: Option<i32>,
    pub is_today: bool,
    pub date_key: String,
    pub has_data: bool,
    pub dominant_icon_code: Option<String>,
}

/// One interpolated hour of a selected day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub hour_of_day: u32,
    pub temperature_c: i32,
    pub humidity_pct: i32,
    pub wind_speed_kmh: i32,
    pub icon_code: String,
}

/// City search result from the geocoding API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

impl CitySuggestion {
    /// "Name, State, CC" when a state is known, else "Name, CC".
    pub fn display_name(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

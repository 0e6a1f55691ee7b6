mod render;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use skycast_core::{AppError, Config, ConfigError, TemperatureUnit};
use skycast_locations::{
    LocationUpdate, LocationsError, LocationsStore, NewLocation, SavedLocation, SqliteKvStore,
};
use skycast_weather::{
    lifestyle_tips, Coordinates, CurrentWeather, ForecastView, GeocodingClient, LocationQuery,
    WeatherClient, DATE_KEY_FORMAT,
};

const SEARCH_LIMIT: u32 = 5;

#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Current weather, 7-day summary and hourly forecast in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show current conditions and the forecast
    Show {
        /// City name (defaults to weather.default_city)
        city: Option<String>,

        /// Latitude of a point, used together with --lon
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude of a point, used together with --lat
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Day to expand into hourly values (YYYY-MM-DD)
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Temperature unit: c or f
        #[arg(long)]
        unit: Option<TemperatureUnit>,

        /// Refresh every weather.refresh_minutes until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Search for cities by name
    Search { query: String },

    /// Manage favorite locations
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List saved locations
    List {
        /// Also fetch current conditions for each location
        #[arg(long)]
        weather: bool,

        /// Temperature unit: c or f
        #[arg(long)]
        unit: Option<TemperatureUnit>,
    },
    /// Look up a city and save it as a favorite
    Add { city: String },
    /// Look up a city and save it without marking it favorite
    Save { city: String },
    /// Change the name or country of a saved location
    Rename {
        id: String,

        #[arg(long, required_unless_present = "country")]
        name: Option<String>,

        #[arg(long)]
        country: Option<String>,
    },
    /// Flip the favorite flag of a saved location
    Toggle { id: String },
    /// Remove a saved location by id
    Remove { id: String },
    /// Remove all saved locations
    Clear,
}

#[tokio::main]
async fn main() {
    if let Err(e) = skycast_core::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load().map_err(|e| ConfigError::Load(format!("{:#}", e)))?;
    let validation = config.validate();
    if !validation.is_valid() {
        return Err(ConfigError::Invalid(validation.error_summary()).into());
    }
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    match cli.command {
        Command::Show {
            city,
            lat,
            lon,
            day,
            unit,
            watch,
        } => {
            let query = match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    let coords = Coordinates::new(lat, lon);
                    if !coords.is_valid() {
                        return Err(AppError::Input(format!("coordinates out of range: {}, {}", lat, lon)));
                    }
                    LocationQuery::Point(coords)
                }
                _ => LocationQuery::City(city.unwrap_or_else(|| config.weather.default_city.clone())),
            };
            let unit = unit.unwrap_or(config.weather.temperature_unit);
            let day_key = day.map(|d| d.format(DATE_KEY_FORMAT).to_string());

            if watch {
                watch_loop(&config, &query, day_key.as_deref(), unit).await
            } else {
                show(&config, &query, day_key.as_deref(), unit).await
            }
        }
        Command::Search { query } => {
            let geocoder = GeocodingClient::from_config(&config.weather)?;
            let found = geocoder.suggest(&query, SEARCH_LIMIT).await;
            print!("{}", render::suggestions(&found));
            Ok(())
        }
        Command::Favorites { action } => favorites(&config, action).await,
    }
}

async fn show(
    config: &Config,
    query: &LocationQuery,
    day_key: Option<&str>,
    unit: TemperatureUnit,
) -> Result<(), AppError> {
    let client = WeatherClient::from_config(&config.weather)?;
    let geocoder = GeocodingClient::from_config(&config.weather)?;
    // Provider timestamps are UTC.
    let today = Utc::now().date_naive();

    let place = async {
        match query {
            LocationQuery::Point(coords) => geocoder.reverse_geocode(*coords).await.ok().flatten(),
            LocationQuery::City(_) => None,
        }
    };
    let (current, forecast, place) = tokio::join!(
        client.current_or_fallback(query),
        client.forecast_or_fallback(query, today),
        place
    );
    let current = current?;
    let forecast = forecast?;

    let label = match place {
        Some(p) => p.display_name(),
        None if current.country.is_empty() => current.name.clone(),
        None => format!("{}, {}", current.name, current.country),
    };
    let favorite = match open_store(config) {
        Ok(store) => store.is_favorite(&current.name, &current.country),
        Err(e) => {
            tracing::warn!("Saved locations unavailable: {}", e);
            false
        }
    };

    let view = ForecastView::build(&forecast, today, day_key);

    println!("{}", render::current(&current, &label, unit, favorite));
    println!("{}", render::tips(&lifestyle_tips(&current)));
    println!("{}", render::days(&view, unit));
    print!("{}", render::hourly(&view, unit));
    Ok(())
}

async fn watch_loop(
    config: &Config,
    query: &LocationQuery,
    day_key: Option<&str>,
    unit: TemperatureUnit,
) -> Result<(), AppError> {
    let period = Duration::from_secs(u64::from(config.weather.refresh_minutes.max(1)) * 60);
    let mut interval = tokio::time::interval(period);
    tracing::info!("Refreshing every {} minutes", period.as_secs() / 60);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = show(config, query, day_key, unit).await {
                    tracing::error!("Refresh failed: {}", e);
                    eprintln!("Error: {}", e.user_message());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping refresh");
                return Ok(());
            }
        }
    }
}

async fn favorites(config: &Config, action: FavoritesAction) -> Result<(), AppError> {
    let mut store = open_store(config)?;

    match action {
        FavoritesAction::List { weather, unit } => {
            let conditions = if weather {
                current_for_saved(config, store.list()).await?
            } else {
                HashMap::new()
            };
            let unit = unit.unwrap_or(config.weather.temperature_unit);
            print!(
                "{}",
                render::locations(&store.favorites(), &store.non_favorites(), &conditions, unit)
            );
        }
        FavoritesAction::Add { city } => {
            let geocoder = GeocodingClient::from_config(&config.weather)?;
            let found = geocoder.resolve_city(&city).await?;
            let saved = store.add_favorite(
                &found.name,
                &found.country,
                found.coordinates.lat,
                found.coordinates.lon,
            )?;
            println!("Added {} ({})", saved.display_name(), saved.id);
        }
        FavoritesAction::Save { city } => {
            let geocoder = GeocodingClient::from_config(&config.weather)?;
            let found = geocoder.resolve_city(&city).await?;
            let saved = store.add(NewLocation::new(
                &found.name,
                &found.country,
                found.coordinates.lat,
                found.coordinates.lon,
            ))?;
            println!("Saved {} ({})", saved.display_name(), saved.id);
        }
        FavoritesAction::Rename { id, name, country } => {
            let update = LocationUpdate {
                name,
                country,
                ..Default::default()
            };
            let renamed = store
                .update(&id, update)?
                .ok_or_else(|| LocationsError::NotFound(id.clone()))?;
            println!("Renamed {} to {}", id, renamed.display_name());
        }
        FavoritesAction::Toggle { id } => {
            let toggled = store.toggle_favorite(&id)?;
            let state = if toggled.is_favorite { "Marked" } else { "Unmarked" };
            println!("{} {} as favorite", state, toggled.display_name());
        }
        FavoritesAction::Remove { id } => {
            if !store.remove(&id)? {
                return Err(LocationsError::NotFound(id).into());
            }
            println!("Removed {}", id);
        }
        FavoritesAction::Clear => {
            store.clear()?;
            println!("Cleared saved locations");
        }
    }
    Ok(())
}

/// Current conditions for each saved location, keyed by id. Locations whose
/// fetch fails are left out.
async fn current_for_saved(
    config: &Config,
    locations: &[SavedLocation],
) -> Result<HashMap<String, CurrentWeather>, AppError> {
    let client = WeatherClient::from_config(&config.weather)?;
    let mut conditions = HashMap::new();
    for location in locations {
        let query = LocationQuery::Point(Coordinates::new(location.lat, location.lon));
        match client.current_or_fallback(&query).await {
            Ok(current) => {
                conditions.insert(location.id.clone(), current);
            }
            Err(e) => tracing::warn!("No weather for {}: {}", location.display_name(), e),
        }
    }
    Ok(conditions)
}

fn open_store(config: &Config) -> Result<LocationsStore<SqliteKvStore>, AppError> {
    std::fs::create_dir_all(&config.storage.data_dir)?;
    let kv = SqliteKvStore::open(config.storage.locations_db())?;
    Ok(LocationsStore::load(kv)?)
}

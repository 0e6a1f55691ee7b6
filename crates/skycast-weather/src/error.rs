//! Weather-specific error types.

use skycast_core::{AppError, NetworkError, ProviderError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey => "No weather API key configured.".to_string(),
            Self::InvalidApiKey => "Weather API key was rejected.".to_string(),
            Self::LocationNotFound(what) => format!("Location not found: {}", what),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::Api { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again later.".to_string()
            }
            Self::Api { message, .. } => format!("Weather service error: {}", message),
            Self::InvalidPayload(_) => "Received unexpected weather data.".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Whether a later attempt could succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether built-in sample data may stand in for this failure.
    ///
    /// A city the provider does not know is reported, never masked.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, Self::LocationNotFound(_))
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::MissingApiKey | WeatherError::InvalidApiKey => {
                AppError::Provider(ProviderError::InvalidApiKey)
            }
            WeatherError::LocationNotFound(what) => AppError::Provider(ProviderError::LocationNotFound(what)),
            WeatherError::RateLimited(secs) => AppError::Provider(ProviderError::RateLimited(secs)),
            WeatherError::Api { status, message } if status >= 500 => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            WeatherError::Api { status, message } => {
                AppError::Provider(ProviderError::Rejected(format!("{}: {}", status, message)))
            }
            WeatherError::InvalidPayload(msg) => {
                AppError::Network(NetworkError::InvalidResponse(msg))
            }
            WeatherError::Network(err) => AppError::Network(err.into_network_error()),
        }
    }
}

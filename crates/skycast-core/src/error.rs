//! Front-end error type for SkyCast.
//!
//! Service crates keep their own error enums and convert into [`AppError`]
//! where the binary reports them. `Display` is for logs; `user_message()` is
//! the one line shown in the terminal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("network: {0}")]
    Network(#[from] NetworkError),

    #[error("weather provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("saved locations: {0}")]
    Storage(#[from] StorageError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Provider(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Input(_) => "Invalid input. Run with --help for usage.",
            AppError::Io(_) => "Could not access the SkyCast data directory.",
        }
    }
}

/// Transport-level failures talking to the weather provider.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("unexpected payload: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Weather service unreachable. Check your connection.",
            NetworkError::Timeout => "Weather service did not answer in time.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "Weather service is having trouble. Try again later."
            }
            NetworkError::ServerError { .. } => "Weather request was rejected.",
            NetworkError::InvalidResponse(_) => "Weather service sent data SkyCast could not read.",
        }
    }
}

/// Failures the provider reports about the request itself.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no such location: {0}")]
    LocationNotFound(String),

    #[error("API key missing or rejected")]
    InvalidApiKey,

    #[error("rate limited for {0}s")]
    RateLimited(u64),

    #[error("{0}")]
    Rejected(String),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::LocationNotFound(_) => "City not found. Check the spelling and try again.",
            ProviderError::InvalidApiKey => {
                "Weather API key is missing or invalid. Set SKYCAST_API_KEY or edit the config."
            }
            ProviderError::RateLimited(_) => "Too many weather requests. Wait a minute and retry.",
            ProviderError::Rejected(_) => "Weather service refused the request.",
        }
    }
}

/// Saved-locations persistence failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("corrupted data: {0}")]
    Corruption(String),

    #[error("no saved location {0}")]
    NotFound(String),

    #[error("{0} is already a favorite")]
    Duplicate(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "Saved locations database could not be opened.",
            StorageError::QueryFailed(_) => "Updating saved locations failed.",
            StorageError::Corruption(_) => {
                "Saved locations are unreadable. Run `skycast favorites clear` to reset them."
            }
            StorageError::NotFound(_) => "No saved location with that id.",
            StorageError::Duplicate(_) => "This location is already in favorites.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not load config: {0}")]
    Load(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Load(_) => "Could not read the SkyCast config file.",
            ConfigError::Invalid(_) => "SkyCast config has invalid values. Check config.toml.",
        }
    }
}

/// Classify reqwest transport errors.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() {
            return NetworkError::InvalidResponse(self.to_string());
        }
        match self.status() {
            Some(status) => NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            },
            None => NetworkError::ConnectionFailed(self.to_string()),
        }
    }
}

/// Classify SQLite errors.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        let code = self.sqlite_error_code();
        match code {
            Some(rusqlite::ErrorCode::DatabaseCorrupt | rusqlite::ErrorCode::NotADatabase) => {
                StorageError::Corruption(self.to_string())
            }
            Some(
                rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::PermissionDenied
                | rusqlite::ErrorCode::ReadOnly,
            ) => StorageError::Unavailable(self.to_string()),
            _ => StorageError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_message() {
        let errors = [
            AppError::from(NetworkError::Timeout),
            AppError::from(ProviderError::RateLimited(60)),
            AppError::from(StorageError::QueryFailed("x".into())),
            AppError::from(ConfigError::Invalid("x".into())),
            AppError::Input("lat 100".into()),
            AppError::from(std::io::Error::other("disk")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "{}", err);
        }
    }

    #[test]
    fn test_duplicate_favorite_message() {
        let err = AppError::Storage(StorageError::Duplicate("Tunis, TN".into()));
        assert_eq!(err.user_message(), "This location is already in favorites.");
        assert_eq!(err.to_string(), "saved locations: Tunis, TN is already a favorite");
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let upstream = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let rejected = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert!(upstream.user_message().contains("later"));
        assert!(!rejected.user_message().contains("later"));
    }

    #[test]
    fn test_sqlite_error_classification() {
        let corrupt = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT),
            Some("database disk image is malformed".into()),
        );
        assert!(matches!(corrupt.into_storage_error(), StorageError::Corruption(_)));

        let cannot_open = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            None,
        );
        assert!(matches!(cannot_open.into_storage_error(), StorageError::Unavailable(_)));

        assert!(matches!(
            rusqlite::Error::InvalidQuery.into_storage_error(),
            StorageError::QueryFailed(_)
        ));
    }
}

use skycast_core::{AppError, RusqliteErrorExt, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationsError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{name}, {country} is already a favorite")]
    AlreadyFavorite { name: String, country: String },

    #[error("Saved location not found: {0}")]
    NotFound(String),
}

impl LocationsError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Sqlite(_) => "Unable to access saved locations.".to_string(),
            Self::Serialization(_) => "Saved locations could not be read or written.".to_string(),
            Self::AlreadyFavorite { name, country } => {
                format!("{}, {} is already in your favorites.", name, country)
            }
            Self::NotFound(id) => format!("No saved location with id {}.", id),
        }
    }

    /// Another process holding the database lock is the only transient case.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Sqlite(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

pub type LocationsResult<T> = Result<T, LocationsError>;

impl From<LocationsError> for StorageError {
    fn from(e: LocationsError) -> Self {
        match e {
            LocationsError::Sqlite(e) => e.into_storage_error(),
            LocationsError::Serialization(e) => StorageError::Corruption(e.to_string()),
            LocationsError::AlreadyFavorite { name, country } => {
                StorageError::Duplicate(format!("{}, {}", name, country))
            }
            LocationsError::NotFound(id) => StorageError::NotFound(id),
        }
    }
}

impl From<LocationsError> for AppError {
    fn from(e: LocationsError) -> Self {
        AppError::Storage(e.into())
    }
}

//! Saved locations for SkyCast
//!
//! Locations and favorites are kept as a JSON list in a small key-value
//! table, backed by SQLite on disk.

pub mod error;
pub mod kv;
pub mod store;

pub use error::{LocationsError, LocationsResult};
pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use store::{LocationUpdate, LocationsStore, NewLocation, SavedLocation, STORAGE_KEY};

//! Saved locations and favorites, persisted as one JSON array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LocationsError, LocationsResult};
use crate::kv::KeyValueStore;

/// Key under which the location list is stored.
pub const STORAGE_KEY: &str = "weather-app-saved-locations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl SavedLocation {
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }

    fn matches(&self, name: &str, country: &str) -> bool {
        self.name == name.trim() && self.country == country.trim()
    }
}

/// Fields for a location being added; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub is_favorite: bool,
}

impl NewLocation {
    pub fn new(name: &str, country: &str, lat: f64, lon: f64) -> Self {
        Self {
            name: name.trim().to_string(),
            country: country.trim().to_string(),
            lat,
            lon,
            is_favorite: false,
        }
    }

    pub fn favorite(mut self) -> Self {
        self.is_favorite = true;
        self
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_favorite: Option<bool>,
}

impl LocationUpdate {
    fn apply(self, location: &mut SavedLocation) {
        if let Some(name) = self.name {
            location.name = name.trim().to_string();
        }
        if let Some(country) = self.country {
            location.country = country.trim().to_string();
        }
        if let Some(lat) = self.lat {
            location.lat = lat;
        }
        if let Some(lon) = self.lon {
            location.lon = lon;
        }
        if let Some(is_favorite) = self.is_favorite {
            location.is_favorite = is_favorite;
        }
    }
}

/// Saved locations over a key-value store.
///
/// The list is loaded once and cached; every mutation writes the whole list
/// back and only updates the cache once the write succeeded.
pub struct LocationsStore<S: KeyValueStore> {
    kv: S,
    locations: Vec<SavedLocation>,
}

impl<S: KeyValueStore> LocationsStore<S> {
    /// Load saved locations. Unreadable data is logged and treated as empty.
    pub fn load(kv: S) -> LocationsResult<Self> {
        let locations = match kv.get(STORAGE_KEY)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::error!("Error loading saved locations, starting empty: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        tracing::debug!("Loaded {} saved locations", locations.len());
        Ok(Self { kv, locations })
    }

    pub fn list(&self) -> &[SavedLocation] {
        &self.locations
    }

    pub fn get(&self, id: &str) -> Option<&SavedLocation> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn add(&mut self, new: NewLocation) -> LocationsResult<SavedLocation> {
        let location = SavedLocation {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            country: new.country,
            lat: new.lat,
            lon: new.lon,
            added_at: Utc::now(),
            is_favorite: new.is_favorite,
        };

        let mut updated = self.locations.clone();
        updated.push(location.clone());
        self.save(updated)?;

        tracing::info!("Saved location {} ({})", location.display_name(), location.id);
        Ok(location)
    }

    /// Apply `update` to the location with `id`. Unknown ids are a no-op
    /// and return `None`.
    pub fn update(
        &mut self,
        id: &str,
        update: LocationUpdate,
    ) -> LocationsResult<Option<SavedLocation>> {
        let Some(index) = self.locations.iter().position(|l| l.id == id) else {
            tracing::debug!("Update for unknown location {}", id);
            return Ok(None);
        };

        let mut updated = self.locations.clone();
        update.apply(&mut updated[index]);
        let location = updated[index].clone();
        self.save(updated)?;
        Ok(Some(location))
    }

    /// Remove by id. Returns whether a location was removed.
    pub fn remove(&mut self, id: &str) -> LocationsResult<bool> {
        let updated: Vec<SavedLocation> = self
            .locations
            .iter()
            .filter(|l| l.id != id)
            .cloned()
            .collect();
        let removed = updated.len() < self.locations.len();
        self.save(updated)?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> LocationsResult<()> {
        self.save(Vec::new())?;
        tracing::info!("Cleared saved locations");
        Ok(())
    }

    pub fn favorites(&self) -> Vec<&SavedLocation> {
        self.locations.iter().filter(|l| l.is_favorite).collect()
    }

    pub fn non_favorites(&self) -> Vec<&SavedLocation> {
        self.locations.iter().filter(|l| !l.is_favorite).collect()
    }

    /// Flip the favorite flag of `id`.
    pub fn toggle_favorite(&mut self, id: &str) -> LocationsResult<SavedLocation> {
        let current = self
            .get(id)
            .map(|l| l.is_favorite)
            .ok_or_else(|| LocationsError::NotFound(id.to_string()))?;

        let update = LocationUpdate {
            is_favorite: Some(!current),
            ..Default::default()
        };
        self.update(id, update)?
            .ok_or_else(|| LocationsError::NotFound(id.to_string()))
    }

    /// Whether a favorite with this exact name and country exists.
    pub fn is_favorite(&self, name: &str, country: &str) -> bool {
        self.locations
            .iter()
            .any(|l| l.is_favorite && l.matches(name, country))
    }

    /// Add a location as a favorite, rejecting duplicates by name and country.
    pub fn add_favorite(
        &mut self,
        name: &str,
        country: &str,
        lat: f64,
        lon: f64,
    ) -> LocationsResult<SavedLocation> {
        if self.is_favorite(name, country) {
            return Err(LocationsError::AlreadyFavorite {
                name: name.trim().to_string(),
                country: country.trim().to_string(),
            });
        }
        self.add(NewLocation::new(name, country, lat, lon).favorite())
    }

    fn save(&mut self, locations: Vec<SavedLocation>) -> LocationsResult<()> {
        let json = serde_json::to_string(&locations)?;
        self.kv.set(STORAGE_KEY, &json).map_err(|e| {
            tracing::error!("Error saving locations: {}", e);
            e
        })?;
        self.locations = locations;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    fn store() -> LocationsStore<MemoryKvStore> {
        LocationsStore::load(MemoryKvStore::new()).unwrap()
    }

    #[test]
    fn test_add_assigns_id_and_timestamp() {
        let mut store = store();
        let before = Utc::now();
        let a = store.add(NewLocation::new(" Paris ", "FR", 48.85, 2.35)).unwrap();
        let b = store.add(NewLocation::new("Rome", "IT", 41.9, 12.5)).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "Paris");
        assert!(a.added_at >= before);
        assert!(!a.is_favorite);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.get(&b.id).map(|l| l.name.as_str()), Some("Rome"));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = store();
        store.add(NewLocation::new("Paris", "FR", 48.85, 2.35)).unwrap();

        let result = store
            .update("nope", LocationUpdate { name: Some("X".into()), ..Default::default() })
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.list()[0].name, "Paris");
    }

    #[test]
    fn test_update_changes_only_given_fields() {
        let mut store = store();
        let saved = store.add(NewLocation::new("Paris", "FR", 48.85, 2.35)).unwrap();

        let updated = store
            .update(&saved.id, LocationUpdate { name: Some("Paris 1er".into()), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Paris 1er");
        assert_eq!(updated.country, "FR");
        assert_eq!(updated.added_at, saved.added_at);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = store();
        let a = store.add(NewLocation::new("Paris", "FR", 48.85, 2.35)).unwrap();
        store.add(NewLocation::new("Rome", "IT", 41.9, 12.5)).unwrap();

        assert!(store.remove(&a.id).unwrap());
        assert!(!store.remove(&a.id).unwrap());
        assert_eq!(store.list().len(), 1);

        store.clear().unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_favorites_partition_and_toggle() {
        let mut store = store();
        let a = store.add(NewLocation::new("Paris", "FR", 48.85, 2.35)).unwrap();
        store.add_favorite("Tunis", "TN", 36.8, 10.18).unwrap();

        assert_eq!(store.favorites().len(), 1);
        assert_eq!(store.non_favorites().len(), 1);

        let toggled = store.toggle_favorite(&a.id).unwrap();
        assert!(toggled.is_favorite);
        assert_eq!(store.favorites().len(), 2);
        assert!(store.non_favorites().is_empty());

        assert!(matches!(store.toggle_favorite("nope"), Err(LocationsError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_favorite_rejected() {
        let mut store = store();
        store.add_favorite("Tunis", "TN", 36.8, 10.18).unwrap();

        let dup = store.add_favorite(" Tunis ", "TN", 36.8, 10.18);
        assert!(matches!(dup, Err(LocationsError::AlreadyFavorite { .. })));
        assert_eq!(store.list().len(), 1);

        // Same name in another country is a different place.
        store.add_favorite("Tunis", "US", 0.0, 0.0).unwrap();
        assert!(store.is_favorite("Tunis", "US"));
    }

    #[test]
    fn test_non_favorite_with_same_name_does_not_block() {
        let mut store = store();
        store.add(NewLocation::new("Tunis", "TN", 36.8, 10.18)).unwrap();
        assert!(!store.is_favorite("Tunis", "TN"));
        assert!(store.add_favorite("Tunis", "TN", 36.8, 10.18).is_ok());
    }

    #[test]
    fn test_corrupt_data_loads_empty() {
        let kv = MemoryKvStore::new();
        kv.set(STORAGE_KEY, "{not json").unwrap();

        let mut store = LocationsStore::load(kv).unwrap();
        assert!(store.list().is_empty());

        store.add(NewLocation::new("Paris", "FR", 48.85, 2.35)).unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_reads_stored_json_without_favorite_flag() {
        let kv = MemoryKvStore::new();
        kv.set(
            STORAGE_KEY,
            r#"[{"id":"lx1","name":"Paris","country":"FR","lat":48.85,"lon":2.35,"addedAt":"2025-06-01T10:00:00.000Z"}]"#,
        )
        .unwrap();

        let store = LocationsStore::load(kv).unwrap();
        let paris = store.get("lx1").unwrap();
        assert!(!paris.is_favorite);
        assert_eq!(paris.display_name(), "Paris, FR");
    }

    struct FailingKv;

    impl KeyValueStore for FailingKv {
        fn get(&self, _key: &str) -> LocationsResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> LocationsResult<()> {
            Err(LocationsError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        fn remove(&self, _key: &str) -> LocationsResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_failure_propagates_and_keeps_cache() {
        let mut store = LocationsStore::load(FailingKv).unwrap();
        assert!(store.add(NewLocation::new("Paris", "FR", 48.85, 2.35)).is_err());
        assert!(store.list().is_empty());
    }
}

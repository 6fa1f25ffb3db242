use fjall::Keyspace;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

use crate::Result;
use crate::error::CitySenseError;
use crate::models::weather_cache_key;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Key-value cache with per-entry expiry, persisted on disk
#[derive(Clone)]
pub struct PersistentCache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CitySenseError::cache(format!("system clock before epoch: {e}")))?
        .as_secs())
}

fn join_error(e: task::JoinError) -> CitySenseError {
    CitySenseError::cache(format!("cache task failed: {e}"))
}

/// Cache key for the suggestion list of a query
#[must_use]
pub fn suggestions_cache_key(query: &str) -> String {
    format!("cities:{}", query.trim().to_lowercase())
}

impl PersistentCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| CitySenseError::cache("TTL overflow"))?
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CitySenseError::cache(e.to_string()))?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(join_error)??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes))
                .await
                .map_err(join_error)??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                // stale layout from an older build
                tracing::debug!("Undecodable entry dropped: {e}");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if now_secs()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(join_error)??;
        Ok(())
    }

    /// Drop the cached forecast for a coordinate pair
    pub async fn invalidate_weather(&self, latitude: f64, longitude: f64) -> Result<()> {
        self.remove(&weather_cache_key(latitude, longitude)).await?;
        tracing::debug!("Weather cache invalidated for ({latitude}, {longitude})");
        Ok(())
    }

    /// Drop the cached suggestion list for a query
    pub async fn invalidate_suggestions(&self, query: &str) -> Result<()> {
        self.remove(&suggestions_cache_key(query)).await?;
        tracing::debug!("City suggestions cache invalidated for '{query}'");
        Ok(())
    }
}

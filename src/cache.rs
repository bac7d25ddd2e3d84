use crate::client::Source;
use crate::error::Result;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    /// Served from the last successful fetch; the live source failed.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub data: Value,
    pub freshness: Freshness,
    /// When `data` was acquired from the live source.
    pub fetched_at: DateTime<Utc>,
}

/// On-disk shape of one cache entry: `{ "data": ..., "ts": "<ISO-8601>" }`.
#[derive(Serialize, Deserialize, Debug)]
struct Entry {
    data: Value,
    ts: DateTime<Utc>,
}

/// Read-through cache: live data when possible, last known good otherwise.
pub struct CachedSource<S> {
    store: S,
}

impl<S: KeyValueStore> CachedSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn load<T: Source>(&self, source: &T, cache_key: &str) -> Result<Loaded> {
        self.load_with(source, cache_key, |_| Ok(())).await
    }

    /// Like [`load`](Self::load), but a payload must pass `validate` before it is stored or served.
    ///
    /// A live payload that fails is dropped and the last good copy is served instead, so a
    /// broken endpoint never overwrites good data. Cached entries that fail count as absent.
    pub async fn load_with<T, F>(&self, source: &T, cache_key: &str, validate: F) -> Result<Loaded>
    where
        T: Source,
        F: Fn(&Value) -> Result<()>,
    {
        let live = source
            .fetch()
            .await
            .and_then(|data| validate(&data).map(|()| data));

        match live {
            Ok(data) => {
                let fetched_at = Utc::now();
                if let Err(e) = self.save(cache_key, &data, fetched_at) {
                    tracing::warn!(key = cache_key, "could not update cache: {}", e);
                }
                tracing::info!(source = source.name(), "fetched fresh data");
                Ok(Loaded {
                    data,
                    freshness: Freshness::Fresh,
                    fetched_at,
                })
            }
            Err(fetch_err) => {
                let usable = self.read(cache_key).filter(|entry| match validate(&entry.data) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(key = cache_key, "ignoring cached entry: {}", e);
                        false
                    }
                });
                match usable {
                    Some(entry) => {
                        tracing::warn!(
                            source = source.name(),
                            cached_at = %entry.ts,
                            "live fetch failed ({}), serving cached copy",
                            fetch_err
                        );
                        Ok(Loaded {
                            data: entry.data,
                            freshness: Freshness::Stale,
                            fetched_at: entry.ts,
                        })
                    }
                    None => Err(fetch_err),
                }
            }
        }
    }

    fn save(&self, key: &str, data: &Value, ts: DateTime<Utc>) -> Result<()> {
        let entry = Entry {
            data: data.clone(),
            ts,
        };
        self.store.put(key, &serde_json::to_string_pretty(&entry)?)
    }

    /// Unreadable or corrupt entries count as absent.
    fn read(&self, key: &str) -> Option<Entry> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, "cache read failed: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(key, "ignoring corrupt cache entry: {}", e);
                None
            }
        }
    }
}

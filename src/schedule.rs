// File: ./src/schedule.rs
// Fetch the three collections, expand, merge
use crate::cache::{CachedSource, Freshness, Loaded};
use crate::client::{HttpSource, Source, build_client};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::expand::{SkippedSchedule, adapt, expand_regulars};
use crate::model::{Eventual, Exception, Occurrence, Regular};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use futures::future::try_join3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const REGULAR_CACHE_KEY: &str = "regular_cache";
pub const EXCEPTION_CACHE_KEY: &str = "excepcion_cache";
pub const EVENTUAL_CACHE_KEY: &str = "eventual_cache";

pub struct ScheduleSources<S> {
    pub regular: S,
    pub exceptions: S,
    pub eventual: S,
}

impl ScheduleSources<HttpSource> {
    /// One HTTPS client shared by the three endpoints.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_client(config.allow_insecure_certs)?;
        Ok(Self {
            regular: HttpSource::with_client(
                "regular",
                &config.endpoint_url(&config.paths.regular),
                client.clone(),
            )?,
            exceptions: HttpSource::with_client(
                "excepcion",
                &config.endpoint_url(&config.paths.exceptions),
                client.clone(),
            )?,
            eventual: HttpSource::with_client(
                "eventual",
                &config.endpoint_url(&config.paths.eventual),
                client,
            )?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceStatus {
    pub freshness: Freshness,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub regular: SourceStatus,
    pub exceptions: SourceStatus,
    pub eventual: SourceStatus,
}

impl SourceReport {
    pub fn is_stale(&self) -> bool {
        self.all().iter().any(|s| s.freshness == Freshness::Stale)
    }

    /// Acquisition time of the oldest stale collection, if any.
    pub fn oldest_stale(&self) -> Option<DateTime<Utc>> {
        self.all()
            .iter()
            .filter(|s| s.freshness == Freshness::Stale)
            .map(|s| s.fetched_at)
            .min()
    }

    fn all(&self) -> [SourceStatus; 3] {
        [self.regular, self.exceptions, self.eventual]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub occurrences: Vec<Occurrence>,
    pub skipped: Vec<SkippedSchedule>,
    pub sources: SourceReport,
    /// When this load finished. Freshness of each collection is in `sources`.
    pub loaded_at: DateTime<Utc>,
}

/// Loads all three collections (concurrently, each with cache fallback) and expands them.
///
/// Any fetch without fallback, payload mismatch or malformed date aborts the whole load.
/// A payload of the wrong shape is treated like a failed fetch, so it never replaces a good cached copy.
pub async fn load<S, K>(sources: &ScheduleSources<S>, cache: &CachedSource<K>) -> Result<Schedule>
where
    S: Source,
    K: KeyValueStore,
{
    let (regular, exceptions, eventual) = try_join3(
        cache.load_with(&sources.regular, REGULAR_CACHE_KEY, |v| {
            check::<Regular>(sources.regular.name(), v)
        }),
        cache.load_with(&sources.exceptions, EXCEPTION_CACHE_KEY, |v| {
            check::<Exception>(sources.exceptions.name(), v)
        }),
        cache.load_with(&sources.eventual, EVENTUAL_CACHE_KEY, |v| {
            check::<Eventual>(sources.eventual.name(), v)
        }),
    )
    .await?;

    let report = SourceReport {
        regular: status(&regular),
        exceptions: status(&exceptions),
        eventual: status(&eventual),
    };

    let regulars: Vec<Regular> = decode(sources.regular.name(), regular)?;
    let exceptions: Vec<Exception> = decode(sources.exceptions.name(), exceptions)?;
    let eventuals: Vec<Eventual> = decode(sources.eventual.name(), eventual)?;

    let expansion = expand_regulars(&regulars, &exceptions)?;
    let mut occurrences = expansion.occurrences;
    occurrences.extend(adapt(&eventuals)?);

    tracing::info!(
        occurrences = occurrences.len(),
        skipped = expansion.skipped.len(),
        stale = report.is_stale(),
        "schedule loaded"
    );

    Ok(Schedule {
        occurrences,
        skipped: expansion.skipped,
        sources: report,
        loaded_at: Utc::now(),
    })
}

fn status(loaded: &Loaded) -> SourceStatus {
    SourceStatus {
        freshness: loaded.freshness,
        fetched_at: loaded.fetched_at,
    }
}

fn payload_error(source_name: &str, source: serde_json::Error) -> Error {
    Error::Payload {
        source_name: source_name.to_string(),
        source,
    }
}

fn check<T: DeserializeOwned>(source_name: &str, data: &Value) -> Result<()> {
    Vec::<T>::deserialize(data)
        .map(drop)
        .map_err(|e| payload_error(source_name, e))
}

fn decode<T: DeserializeOwned>(source_name: &str, loaded: Loaded) -> Result<Vec<T>> {
    serde_json::from_value(loaded.data).map_err(|e| payload_error(source_name, e))
}

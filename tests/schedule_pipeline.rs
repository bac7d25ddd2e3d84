use chrono::Utc;
use serde_json::{Value, json};
use tutorcal::cache::{CachedSource, Freshness};
use tutorcal::client::StaticSource;
use tutorcal::error::Error;
use tutorcal::model::UnresolvedWeekday;
use tutorcal::schedule::{self, REGULAR_CACHE_KEY, ScheduleSources};
use tutorcal::storage::{KeyValueStore, MemoryStore};

fn regulars() -> Value {
    json!([{
        "ID_Regular": "R1",
        "Alumno": "Ana",
        "Tutor": "Luis",
        "Curso": "Álgebra",
        "Modalidad": "Presencial",
        "Dia_Semana": "lunes",
        "Hora_Inicio": "09:00:00",
        "Hora_Final": "10:00:00",
        "Inicio_Contrato": "2024-03-01",
        "Fin_Contrato": "2024-03-22"
    }])
}

fn sources(
    regular: StaticSource,
    exceptions: StaticSource,
    eventual: StaticSource,
) -> ScheduleSources<StaticSource> {
    ScheduleSources {
        regular,
        exceptions,
        eventual,
    }
}

fn only_regulars(data: Value) -> ScheduleSources<StaticSource> {
    sources(
        StaticSource::ok("regular", data),
        StaticSource::ok("excepcion", json!([])),
        StaticSource::ok("eventual", json!([])),
    )
}

#[tokio::test]
async fn test_merges_regular_and_eventual_occurrences() {
    let srcs = sources(
        StaticSource::ok("regular", regulars()),
        StaticSource::ok(
            "excepcion",
            json!([{"ID_Regular": "R1", "Fecha": "2024-03-11"}]),
        ),
        StaticSource::ok(
            "eventual",
            json!([{
                "ID_Evento": 5,
                "Alumno": "Bea",
                "Tutor": "Luis",
                "Curso": "Física",
                "Modalidad": "Virtual",
                "Fecha": "2024-03-13",
                "Hora_Inicio": "15:00:00",
                "Hora_Final": "16:00:00"
            }]),
        ),
    );
    let cache = CachedSource::new(MemoryStore::new());
    let loaded = schedule::load(&srcs, &cache).await.unwrap();

    let ids: Vec<&str> = loaded.occurrences.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["R1-20240304-09:00:00", "R1-20240318-09:00:00", "5"]
    );
    assert!(loaded.skipped.is_empty());
    assert!(!loaded.sources.is_stale());
}

#[tokio::test]
async fn test_load_time_is_recorded() {
    let cache = CachedSource::new(MemoryStore::new());
    let before = Utc::now();
    let loaded = schedule::load(&only_regulars(regulars()), &cache)
        .await
        .unwrap();
    let after = Utc::now();

    assert!(before <= loaded.loaded_at && loaded.loaded_at <= after);
    assert!(loaded.sources.regular.fetched_at <= loaded.loaded_at);

    let out = serde_json::to_value(&loaded).unwrap();
    assert!(out["loaded_at"].is_string());
    assert_eq!(out["sources"]["regular"]["freshness"], "fresh");
}

#[tokio::test]
async fn test_one_failing_source_degrades_to_stale() {
    let cache = CachedSource::new(MemoryStore::new());
    schedule::load(&only_regulars(regulars()), &cache)
        .await
        .unwrap();

    let degraded = sources(
        StaticSource::ok("regular", regulars()),
        StaticSource::failing("excepcion", "HTTP 503"),
        StaticSource::ok("eventual", json!([])),
    );
    let loaded = schedule::load(&degraded, &cache).await.unwrap();
    assert!(loaded.sources.is_stale());
    assert_eq!(loaded.sources.exceptions.freshness, Freshness::Stale);
    assert_eq!(loaded.sources.regular.freshness, Freshness::Fresh);
    assert_eq!(
        loaded.sources.oldest_stale(),
        Some(loaded.sources.exceptions.fetched_at)
    );
    assert!(loaded.sources.exceptions.fetched_at <= loaded.loaded_at);
    assert_eq!(loaded.occurrences.len(), 3);
}

#[tokio::test]
async fn test_missing_source_without_cache_fails_the_load() {
    let cache = CachedSource::new(MemoryStore::new());
    let srcs = sources(
        StaticSource::ok("regular", regulars()),
        StaticSource::ok("excepcion", json!([])),
        StaticSource::failing("eventual", "timeout"),
    );
    assert!(matches!(
        schedule::load(&srcs, &cache).await,
        Err(Error::SourceUnavailable { source_name, .. }) if source_name == "eventual"
    ));
}

#[tokio::test]
async fn test_wrong_payload_shape_is_reported() {
    let cache = CachedSource::new(MemoryStore::new());
    let srcs = only_regulars(json!({"error": "relation does not exist"}));
    assert!(matches!(
        schedule::load(&srcs, &cache).await,
        Err(Error::Payload { source_name, .. }) if source_name == "regular"
    ));
    assert_eq!(cache.store().get(REGULAR_CACHE_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_wrong_payload_shape_does_not_replace_good_cache() {
    // 1. Good load primes the cache
    let cache = CachedSource::new(MemoryStore::new());
    schedule::load(&only_regulars(regulars()), &cache)
        .await
        .unwrap();
    let before = cache.store().get(REGULAR_CACHE_KEY).unwrap();

    // 2. Endpoint answers 200 with an error object
    let broken = only_regulars(json!({"error": "relation does not exist"}));
    let loaded = schedule::load(&broken, &cache).await.unwrap();

    // 3. Previous regulars are served stale and the cache is unchanged
    assert_eq!(loaded.sources.regular.freshness, Freshness::Stale);
    assert_eq!(loaded.occurrences.len(), 3);
    assert_eq!(cache.store().get(REGULAR_CACHE_KEY).unwrap(), before);
}

#[tokio::test]
async fn test_unresolved_weekday_surfaces_as_skipped() {
    let cache = CachedSource::new(MemoryStore::new());
    let mut data = regulars();
    data[0]["Dia_Semana"] = json!("noseque");
    let loaded = schedule::load(&only_regulars(data), &cache).await.unwrap();
    assert!(loaded.occurrences.is_empty());
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].regular_id, "R1");
}

#[tokio::test]
async fn test_float_weekday_column_expands() {
    let cache = CachedSource::new(MemoryStore::new());
    let mut data = regulars();
    data[0]["Dia_Semana"] = json!(1.0);
    let loaded = schedule::load(&only_regulars(data), &cache).await.unwrap();
    assert_eq!(loaded.occurrences.len(), 3);

    let mut data = regulars();
    data[0]["Dia_Semana"] = json!("1.0");
    let loaded = schedule::load(&only_regulars(data), &cache).await.unwrap();
    assert_eq!(loaded.occurrences.len(), 3);
}

#[tokio::test]
async fn test_non_day_weekday_is_skipped_not_fatal() {
    let cache = CachedSource::new(MemoryStore::new());
    let mut data = regulars();
    data.as_array_mut().unwrap().push(json!({
        "ID_Regular": "R2",
        "Alumno": "Bea",
        "Dia_Semana": true,
        "Hora_Inicio": "11:00:00",
        "Hora_Final": "12:00:00",
        "Inicio_Contrato": "2024-03-01",
        "Fin_Contrato": "2024-03-22"
    }));

    let loaded = schedule::load(&only_regulars(data), &cache).await.unwrap();
    assert_eq!(loaded.occurrences.len(), 3);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].regular_id, "R2");
    assert_eq!(
        loaded.skipped[0].reason,
        UnresolvedWeekday::NotAWeekday(json!(true))
    );
}

//! Live integration tests for rankwatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness, so they need `DATABASE_URL` pointing at a server the
//! harness can create databases on. Run with `cargo test -- --ignored`.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rankwatch_core::{KeywordSnapshot, KeywordStore, Language, StoreError};
use rankwatch_db::{
    list_keyword_history, list_keyword_rankings, upsert_keyword_rankings, DbError, PgKeywordStore,
};

fn snapshot(keyword: &str, language: Language, position: i32) -> KeywordSnapshot {
    KeywordSnapshot::new(
        keyword,
        language,
        position,
        format!("https://example.com/{}/{}", language.code(), keyword.replace(' ', "-")),
    )
}

fn day(d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, d, 6, 0, 0).unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn first_upsert_has_no_previous_position(pool: sqlx::PgPool) {
    let batch = [snapshot("sniper bot", Language::En, 12)];
    let written = upsert_keyword_rankings(&pool, &batch, day(1))
        .await
        .expect("upsert failed");
    assert_eq!(written, 1);

    let records = list_keyword_rankings(&pool, None).await.expect("list failed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].position, 12);
    assert_eq!(records[0].previous_position, None);
    assert_eq!(records[0].change, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn second_upsert_rotates_previous_position(pool: sqlx::PgPool) {
    upsert_keyword_rankings(&pool, &[snapshot("sniper bot", Language::En, 12)], day(1))
        .await
        .unwrap();
    upsert_keyword_rankings(&pool, &[snapshot("sniper bot", Language::En, 7)], day(2))
        .await
        .unwrap();

    let records = list_keyword_rankings(&pool, Some(Language::En)).await.unwrap();
    assert_eq!(records[0].position, 7);
    assert_eq!(records[0].previous_position, Some(12));
    assert_eq!(records[0].change, 5);
    assert_eq!(records[0].last_updated, day(2));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn repeated_position_overwrites_previous(pool: sqlx::PgPool) {
    for (d, position) in [(1, 12), (2, 7), (3, 7)] {
        upsert_keyword_rankings(&pool, &[snapshot("sniper bot", Language::En, position)], day(d))
            .await
            .unwrap();
    }

    let records = list_keyword_rankings(&pool, None).await.unwrap();
    assert_eq!(records[0].previous_position, Some(7));
    assert_eq!(records[0].change, 0);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn invalid_batch_writes_nothing(pool: sqlx::PgPool) {
    let batch = vec![
        snapshot("sniper bot", Language::En, 4),
        snapshot("trading bot", Language::De, 0),
    ];
    let err = upsert_keyword_rankings(&pool, &batch, day(1)).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    let records = list_keyword_rankings(&pool, None).await.unwrap();
    assert!(records.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn language_filter_limits_results(pool: sqlx::PgPool) {
    let batch = vec![
        snapshot("trading bot", Language::En, 3),
        snapshot("trading bot", Language::De, 9),
        snapshot("krypto bot", Language::De, 15),
    ];
    upsert_keyword_rankings(&pool, &batch, day(1)).await.unwrap();

    let de = list_keyword_rankings(&pool, Some(Language::De)).await.unwrap();
    assert_eq!(de.len(), 2);
    assert!(de.iter().all(|r| r.language == Language::De));
    assert_eq!(list_keyword_rankings(&pool, None).await.unwrap().len(), 3);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn history_keeps_one_point_per_day(pool: sqlx::PgPool) {
    let morning = day(1);
    let evening = morning + Duration::hours(10);
    upsert_keyword_rankings(&pool, &[snapshot("sniper bot", Language::En, 12)], morning)
        .await
        .unwrap();
    upsert_keyword_rankings(&pool, &[snapshot("sniper bot", Language::En, 9)], evening)
        .await
        .unwrap();
    upsert_keyword_rankings(&pool, &[snapshot("sniper bot", Language::En, 6)], day(2))
        .await
        .unwrap();

    let since = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
    let history = list_keyword_history(&pool, "sniper bot", Language::En, since)
        .await
        .unwrap();
    let positions: Vec<i32> = history.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![9, 6]);

    let since_day_two = NaiveDate::from_ymd_opt(2026, 10, 2).unwrap();
    let recent = list_keyword_history(&pool, "sniper bot", Language::En, since_day_two)
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn store_trait_reports_validation_errors(pool: sqlx::PgPool) {
    let store = PgKeywordStore::new(pool);
    let err = store
        .upsert(&[KeywordSnapshot::new("sniper bot", Language::En, 3, "")])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    store.health_check().await.expect("health check failed");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn surrounding_whitespace_does_not_split_a_keyword(pool: sqlx::PgPool) {
    let first = [snapshot(" sniper bot", Language::En, 12)];
    let second = [snapshot("sniper bot ", Language::En, 7)];
    upsert_keyword_rankings(&pool, &first, day(1)).await.unwrap();
    upsert_keyword_rankings(&pool, &second, day(2)).await.unwrap();

    let records = list_keyword_rankings(&pool, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].keyword, "sniper bot");
    assert_eq!(records[0].previous_position, Some(12));
    assert_eq!(records[0].change, 5);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn concurrent_batches_rotate_through_each_other(pool: sqlx::PgPool) {
    let seed = [snapshot("sniper bot", Language::En, 5)];
    upsert_keyword_rankings(&pool, &seed, day(1)).await.unwrap();

    let left = [snapshot("sniper bot", Language::En, 10)];
    let right = [snapshot("sniper bot", Language::En, 20)];
    let (a, b) = tokio::join!(
        upsert_keyword_rankings(&pool, &left, day(2)),
        upsert_keyword_rankings(&pool, &right, day(2)),
    );
    assert_eq!(a.unwrap(), 1);
    assert_eq!(b.unwrap(), 1);

    let records = list_keyword_rankings(&pool, None).await.unwrap();
    assert_eq!(records.len(), 1);
    let chain = (records[0].position, records[0].previous_position);
    assert!(
        chain == (10, Some(20)) || chain == (20, Some(10)),
        "one batch must observe the other's write, got {chain:?}"
    );
}

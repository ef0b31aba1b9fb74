//! Offline unit tests for rankwatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::{NaiveDate, TimeZone, Utc};
use rankwatch_core::{
    AlertThreshold, AppConfig, Environment, HistoryPoint, KeywordRecord, Language,
};
use rankwatch_db::{KeywordHistoryRow, KeywordRankingRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        keywords_path: PathBuf::from("./config/keywords.yaml"),
        cron_secret: Some("secret".to_string()),
        admin_api_keys: vec!["key".to_string()],
        alert_threshold: AlertThreshold::default(),
        alert_recipients: Vec::new(),
        mail: None,
        feed: None,
        request_timeout_secs: 30,
        scheduler_enabled: false,
        update_cron: "0 0 6 * * *".to_string(),
        alert_cron: "0 30 6 * * *".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn ranking_row(language: &str, position: i32, previous: Option<i32>) -> KeywordRankingRow {
    KeywordRankingRow {
        keyword: "sniper bot".to_string(),
        language: language.to_string(),
        position,
        previous_position: previous,
        search_volume: Some(1_200),
        url: "https://example.com/en/sniper-bot".to_string(),
        last_updated: Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap(),
    }
}

#[test]
fn ranking_row_converts_and_derives_change() {
    let record = KeywordRecord::try_from(ranking_row("en", 7, Some(12))).unwrap();

    assert_eq!(record.language, Language::En);
    assert_eq!(record.position, 7);
    assert_eq!(record.previous_position, Some(12));
    assert_eq!(record.change, 5);
    assert_eq!(record.search_volume, Some(1_200));
}

#[test]
fn ranking_row_without_previous_has_zero_change() {
    let record = KeywordRecord::try_from(ranking_row("de", 3, None)).unwrap();
    assert_eq!(record.language, Language::De);
    assert_eq!(record.change, 0);
}

#[test]
fn ranking_row_with_unknown_language_is_rejected() {
    let err = KeywordRecord::try_from(ranking_row("it", 3, None)).unwrap_err();
    assert!(err.to_string().contains("it"), "unexpected error: {err}");
}

#[test]
fn history_row_maps_to_point() {
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let point = HistoryPoint::from(KeywordHistoryRow {
        snapshot_date: date,
        position: 4,
    });
    assert_eq!(point, HistoryPoint { date, position: 4 });
}

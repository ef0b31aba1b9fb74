use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use chrono::{Days, NaiveDate, Utc};
use rankwatch_core::{
    alerts_from_records, generate_all_reports, generate_report, group_by_language, Alert,
    AlertThreshold, HistoryPoint, KeywordRecord, KeywordSnapshot, Language, LanguageMap, Report,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_store_error, ok, ApiError, ApiResponse, AppState};

const DEFAULT_HISTORY_DAYS: i64 = 30;
const MAX_HISTORY_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct LanguageQuery {
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub keyword: Option<String>,
    pub language: Option<String>,
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AlertPreviewQuery {
    pub threshold: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryData {
    keyword: String,
    language: Language,
    days: i64,
    since: NaiveDate,
    points: Vec<HistoryPoint>,
}

#[derive(Debug, Serialize)]
pub(super) struct AlertPreview {
    threshold: i32,
    total: usize,
    alerts: LanguageMap<Vec<Alert>>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImportResult {
    updated: usize,
}

fn parse_language(request_id: &str, raw: &str) -> Result<Language, ApiError> {
    raw.parse::<Language>()
        .map_err(|e| ApiError::new(request_id, "bad_request", e.to_string()))
}

fn require_language(request_id: &str, raw: Option<&str>) -> Result<Language, ApiError> {
    let raw = raw.ok_or_else(|| {
        ApiError::new(
            request_id,
            "bad_request",
            "query parameter 'language' is required",
        )
    })?;
    parse_language(request_id, raw)
}

/// First day of a `days`-long window ending today, so `days = 1` is today only.
pub(super) fn history_since(today: NaiveDate, days: i64) -> NaiveDate {
    today
        .checked_sub_days(Days::new(days.saturating_sub(1).unsigned_abs()))
        .unwrap_or(NaiveDate::MIN)
}

pub(super) async fn list_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<ApiResponse<Vec<KeywordRecord>>>, ApiError> {
    let language = query
        .language
        .as_deref()
        .map(|raw| parse_language(&req_id.0, raw))
        .transpose()?;

    let mut records = state
        .store()
        .get_all(language)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    records.sort_by(|a, b| {
        a.language
            .cmp(&b.language)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });

    Ok(ok(req_id.0, records))
}

pub(super) async fn keyword_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryData>>, ApiError> {
    let keyword = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "bad_request",
                "query parameter 'keyword' is required",
            )
        })?
        .to_string();
    let language = require_language(&req_id.0, query.language.as_deref())?;

    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if !(1..=MAX_HISTORY_DAYS).contains(&days) {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            format!("days must be between 1 and {MAX_HISTORY_DAYS}"),
        ));
    }
    let since = history_since(Utc::now().date_naive(), days);

    let points = state
        .store()
        .get_history(&keyword, language, since)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(ok(
        req_id.0,
        HistoryData {
            keyword,
            language,
            days,
            since,
            points,
        },
    ))
}

pub(super) async fn keyword_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<ApiResponse<Report>>, ApiError> {
    let language = require_language(&req_id.0, query.language.as_deref())?;

    let report = generate_report(state.store(), language)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(ok(req_id.0, report))
}

pub(super) async fn keyword_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<LanguageMap<Report>>>, ApiError> {
    let reports = generate_all_reports(state.store())
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(ok(req_id.0, reports))
}

/// Alerts that would be sent right now, grouped by language. Sends nothing.
pub(super) async fn alert_preview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AlertPreviewQuery>,
) -> Result<Json<ApiResponse<AlertPreview>>, ApiError> {
    let threshold = match query.threshold {
        Some(raw) => AlertThreshold::new(raw)
            .map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.to_string()))?,
        None => state.jobs.alert_threshold,
    };

    let records = state
        .store()
        .get_all(None)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    let alerts = alerts_from_records(&records, threshold);

    Ok(ok(
        req_id.0,
        AlertPreview {
            threshold: threshold.get(),
            total: alerts.len(),
            alerts: group_by_language(alerts),
        },
    ))
}

pub(super) async fn import_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<Vec<KeywordSnapshot>>, JsonRejection>,
) -> Result<Json<ApiResponse<ImportResult>>, ApiError> {
    let Json(snapshots) =
        payload.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;

    let updated = state
        .store()
        .upsert(&snapshots)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    tracing::info!(
        request_id = %req_id.0,
        submitted = snapshots.len(),
        updated,
        "keyword import applied"
    );
    Ok(ok(req_id.0, ImportResult { updated }))
}

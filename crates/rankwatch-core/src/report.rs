//! Per-language ranking reports: top, improving, declining, and opportunity buckets.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use futures::future::try_join5;
use serde::Serialize;

use crate::{KeywordRecord, KeywordStore, Language, LanguageMap, StoreError};

/// Maximum number of records in any report bucket.
pub const BUCKET_LIMIT: usize = 10;
/// Positions at or above this rank count as "top 10".
pub const TOP_POSITION: i32 = 10;
pub const PODIUM_POSITION: i32 = 3;
/// Opportunities need strictly more monthly searches than this.
pub const OPPORTUNITY_MIN_VOLUME: i32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageSummary {
    /// Mean position over every record, one decimal place. `None` when the
    /// language has no records.
    pub average_position: Option<f64>,
    pub keywords_in_top10: usize,
    pub keywords_in_top3: usize,
    pub total_keywords: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub language: Language,
    pub generated_at: DateTime<Utc>,
    pub top_keywords: Vec<KeywordRecord>,
    pub improving_keywords: Vec<KeywordRecord>,
    pub declining_keywords: Vec<KeywordRecord>,
    pub opportunities: Vec<KeywordRecord>,
    pub language_summary: LanguageSummary,
}

/// Fetch the current records for `language` and project them into a [`Report`].
///
/// # Errors
///
/// Returns the store's error unchanged.
pub async fn generate_report<S>(store: &S, language: Language) -> Result<Report, StoreError>
where
    S: KeywordStore + ?Sized,
{
    let records = store.get_all(Some(language)).await?;
    Ok(build_report(language, records, Utc::now()))
}

/// Build a report for every language, fetching each language concurrently.
///
/// # Errors
///
/// Returns the first store error encountered.
pub async fn generate_all_reports<S>(store: &S) -> Result<LanguageMap<Report>, StoreError>
where
    S: KeywordStore + ?Sized,
{
    let (de, en, es, fr, zh) = try_join5(
        generate_report(store, Language::De),
        generate_report(store, Language::En),
        generate_report(store, Language::Es),
        generate_report(store, Language::Fr),
        generate_report(store, Language::Zh),
    )
    .await?;
    Ok(LanguageMap::from_slots([de, en, es, fr, zh]))
}

/// Partition `records` into report buckets. Records for other languages are ignored.
#[must_use]
pub fn build_report(
    language: Language,
    mut records: Vec<KeywordRecord>,
    generated_at: DateTime<Utc>,
) -> Report {
    records.retain(|r| r.language == language);
    let language_summary = summarize(&records);

    let mut top_keywords: Vec<KeywordRecord> = records
        .iter()
        .filter(|r| r.position <= TOP_POSITION)
        .cloned()
        .collect();
    top_keywords.sort_by(|a, b| (a.position, &a.keyword).cmp(&(b.position, &b.keyword)));
    top_keywords.truncate(BUCKET_LIMIT);

    let mut improving_keywords: Vec<KeywordRecord> =
        records.iter().filter(|r| r.change > 0).cloned().collect();
    improving_keywords.sort_by_key(|r| (Reverse(r.change), r.position, r.keyword.clone()));
    improving_keywords.truncate(BUCKET_LIMIT);

    let mut declining_keywords: Vec<KeywordRecord> =
        records.iter().filter(|r| r.change < 0).cloned().collect();
    declining_keywords.sort_by_key(|r| (r.change, r.position, r.keyword.clone()));
    declining_keywords.truncate(BUCKET_LIMIT);

    let mut opportunities: Vec<KeywordRecord> = records
        .into_iter()
        .filter(|r| {
            r.position > TOP_POSITION
                && r.search_volume.is_some_and(|v| v > OPPORTUNITY_MIN_VOLUME)
        })
        .collect();
    opportunities.sort_by_key(|r| (Reverse(r.search_volume), r.position, r.keyword.clone()));
    opportunities.truncate(BUCKET_LIMIT);

    Report {
        language,
        generated_at,
        top_keywords,
        improving_keywords,
        declining_keywords,
        opportunities,
        language_summary,
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(records: &[KeywordRecord]) -> LanguageSummary {
    let total_keywords = records.len();
    let average_position = (total_keywords > 0).then(|| {
        let sum: i64 = records.iter().map(|r| i64::from(r.position)).sum();
        let mean = sum as f64 / total_keywords as f64;
        (mean * 10.0).round() / 10.0
    });

    LanguageSummary {
        average_position,
        keywords_in_top10: records.iter().filter(|r| r.position <= TOP_POSITION).count(),
        keywords_in_top3: records
            .iter()
            .filter(|r| r.position <= PODIUM_POSITION)
            .count(),
        total_keywords,
    }
}

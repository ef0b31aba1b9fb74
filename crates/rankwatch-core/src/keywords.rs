//! Keyword ranking records: incoming snapshots, stored records, history points.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::compute_change;
use crate::{Language, ValidationError};

/// One observed ranking for a `(keyword, language)` pair, as imported or fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSnapshot {
    pub keyword: String,
    pub language: Language,
    /// 1-based search result rank; lower is better.
    pub position: i32,
    #[serde(default, alias = "search_volume")]
    pub search_volume: Option<i32>,
    /// Absolute URL the keyword resolves to. Empty when the payload omitted it,
    /// which validation rejects.
    #[serde(default)]
    pub url: String,
}

impl KeywordSnapshot {
    pub fn new(
        keyword: impl Into<String>,
        language: Language,
        position: i32,
        url: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            language,
            position,
            search_volume: None,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn with_search_volume(mut self, volume: i32) -> Self {
        self.search_volume = Some(volume);
        self
    }
}

/// The live ranking for a `(keyword, language)` pair.
///
/// `change` is derived from the two stored positions every time a record is
/// materialized; see [`KeywordRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub language: Language,
    pub position: i32,
    pub previous_position: Option<i32>,
    pub change: i32,
    pub search_volume: Option<i32>,
    pub url: String,
    pub last_updated: DateTime<Utc>,
}

impl KeywordRecord {
    #[must_use]
    pub fn new(
        keyword: String,
        language: Language,
        position: i32,
        previous_position: Option<i32>,
        search_volume: Option<i32>,
        url: String,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            change: compute_change(position, previous_position),
            keyword,
            language,
            position,
            previous_position,
            search_volume,
            url,
            last_updated,
        }
    }
}

/// A single day's position for one keyword, used for trend charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub position: i32,
}

/// Validate a whole batch; the first malformed snapshot rejects it.
///
/// # Errors
///
/// Returns the [`ValidationError`] for the first offending snapshot.
pub fn validate_snapshots(snapshots: &[KeywordSnapshot]) -> Result<(), ValidationError> {
    snapshots
        .iter()
        .enumerate()
        .try_for_each(|(index, snapshot)| validate_snapshot(index, snapshot))
}

fn validate_snapshot(index: usize, snapshot: &KeywordSnapshot) -> Result<(), ValidationError> {
    if snapshot.keyword.trim().is_empty() {
        return Err(ValidationError::EmptyKeyword { index });
    }
    if snapshot.position < 1 {
        return Err(ValidationError::NonPositivePosition {
            index,
            position: snapshot.position,
        });
    }
    if let Some(volume) = snapshot.search_volume {
        if volume < 0 {
            return Err(ValidationError::NegativeSearchVolume { index, volume });
        }
    }

    let url = snapshot.url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingUrl { index });
    }
    if !is_absolute_http_url(url) {
        return Err(ValidationError::InvalidUrl {
            index,
            url: snapshot.url.clone(),
        });
    }

    Ok(())
}

pub(crate) fn is_absolute_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split('/').next().unwrap_or_default();
            !host.is_empty() && !rest.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(position: i32) -> KeywordSnapshot {
        KeywordSnapshot::new("sniper bot", Language::En, position, "https://x/y")
    }

    #[test]
    fn accepts_well_formed_batch() {
        let batch = vec![snapshot(1), snapshot(45).with_search_volume(500)];
        assert!(validate_snapshots(&batch).is_ok());
    }

    #[test]
    fn rejects_empty_keyword() {
        let mut bad = snapshot(3);
        bad.keyword = "   ".to_string();
        let err = validate_snapshots(&[snapshot(1), bad]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyKeyword { index: 1 });
    }

    #[test]
    fn rejects_zero_and_negative_positions() {
        assert_eq!(
            validate_snapshots(&[snapshot(0)]).unwrap_err(),
            ValidationError::NonPositivePosition {
                index: 0,
                position: 0
            }
        );
        assert!(matches!(
            validate_snapshots(&[snapshot(-4)]),
            Err(ValidationError::NonPositivePosition { position: -4, .. })
        ));
    }

    #[test]
    fn rejects_missing_url() {
        let mut bad = snapshot(3);
        bad.url = String::new();
        assert_eq!(
            validate_snapshots(&[bad]).unwrap_err(),
            ValidationError::MissingUrl { index: 0 }
        );
    }

    #[test]
    fn rejects_relative_url() {
        let mut bad = snapshot(3);
        bad.url = "/de/blog".to_string();
        assert!(matches!(
            validate_snapshots(&[bad]),
            Err(ValidationError::InvalidUrl { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_negative_search_volume() {
        let bad = snapshot(3).with_search_volume(-1);
        assert!(matches!(
            validate_snapshots(&[bad]),
            Err(ValidationError::NegativeSearchVolume { volume: -1, .. })
        ));
    }

    #[test]
    fn snapshot_deserializes_camel_case_and_missing_url() {
        let parsed: KeywordSnapshot = serde_json::from_str(
            r#"{"keyword":"trading bot","language":"de","position":4,"searchVolume":900}"#,
        )
        .unwrap();
        assert_eq!(parsed.search_volume, Some(900));
        assert!(parsed.url.is_empty());
    }

    #[test]
    fn record_change_is_derived_from_positions() {
        let record = KeywordRecord::new(
            "sniper bot".to_string(),
            Language::En,
            7,
            Some(12),
            None,
            "https://x/y".to_string(),
            Utc::now(),
        );
        assert_eq!(record.change, 5);
    }
}

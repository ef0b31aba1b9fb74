//! Threshold-based rank change alerts.

use serde::{Deserialize, Serialize};

use crate::{CoreError, KeywordRecord, KeywordStore, Language, LanguageMap, StoreError};

pub const DEFAULT_ALERT_THRESHOLD: i32 = 5;

/// Minimum absolute rank movement that raises an alert. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct AlertThreshold(i32);

impl AlertThreshold {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidThreshold`] for values below 1.
    pub fn new(value: i32) -> Result<Self, CoreError> {
        if value >= 1 {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidThreshold(value))
        }
    }

    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Default for AlertThreshold {
    fn default() -> Self {
        Self(DEFAULT_ALERT_THRESHOLD)
    }
}

impl TryFrom<i32> for AlertThreshold {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AlertThreshold> for i32 {
    fn from(threshold: AlertThreshold) -> Self {
        threshold.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub keyword: String,
    pub language: Language,
    pub old_position: i32,
    pub new_position: i32,
    /// `old_position - new_position`; positive is an improvement.
    pub change: i32,
    pub url: String,
}

impl Alert {
    #[must_use]
    pub fn is_improvement(&self) -> bool {
        self.change > 0
    }
}

/// Fetch every language's records and raise an alert for each qualifying change.
///
/// # Errors
///
/// Returns the store's error unchanged.
pub async fn evaluate_alerts<S>(
    store: &S,
    threshold: AlertThreshold,
) -> Result<Vec<Alert>, StoreError>
where
    S: KeywordStore + ?Sized,
{
    let records = store.get_all(None).await?;
    let alerts = alerts_from_records(&records, threshold);
    tracing::debug!(
        records = records.len(),
        alerts = alerts.len(),
        threshold = threshold.get(),
        "evaluated keyword alerts"
    );
    Ok(alerts)
}

/// Records with a previous position whose `|change|` reaches `threshold`.
#[must_use]
pub fn alerts_from_records(records: &[KeywordRecord], threshold: AlertThreshold) -> Vec<Alert> {
    records
        .iter()
        .filter_map(|record| {
            let old_position = record.previous_position?;
            (record.change.abs() >= threshold.get()).then(|| Alert {
                keyword: record.keyword.clone(),
                language: record.language,
                old_position,
                new_position: record.position,
                change: record.change,
                url: record.url.clone(),
            })
        })
        .collect()
}

/// Bucket alerts per language; each bucket is ordered by largest movement first.
#[must_use]
pub fn group_by_language(alerts: Vec<Alert>) -> LanguageMap<Vec<Alert>> {
    let mut groups: LanguageMap<Vec<Alert>> = LanguageMap::default();
    for alert in alerts {
        groups.get_mut(alert.language).push(alert);
    }
    for language in Language::ALL {
        groups
            .get_mut(language)
            .sort_by(|a, b| {
                b.change
                    .abs()
                    .cmp(&a.change.abs())
                    .then_with(|| a.keyword.cmp(&b.keyword))
            });
    }
    groups
}

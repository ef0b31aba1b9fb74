use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{HistoryPoint, KeywordRecord, KeywordSnapshot, Language, StoreError};

/// Persistence for keyword rankings.
///
/// Implementations must treat each `upsert` batch as a unit: validate it
/// wholesale, then apply every snapshot or none. For a key that already
/// exists, reading the old position into `previous_position` and writing the
/// new one must be a single atomic step so concurrent imports cannot both
/// observe the same previous value.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Insert or replace the live record for each snapshot's `(keyword, language)`.
    /// Returns the number of records written.
    async fn upsert(&self, snapshots: &[KeywordSnapshot]) -> Result<usize, StoreError>;

    /// All live records, optionally limited to one language. Order is unspecified.
    async fn get_all(&self, language: Option<Language>) -> Result<Vec<KeywordRecord>, StoreError>;

    /// Daily positions for one keyword since `since` (inclusive), oldest first.
    async fn get_history(
        &self,
        keyword: &str,
        language: Language,
        since: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//! In-process [`KeywordStore`] with the same upsert semantics as the Postgres store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::keywords::validate_snapshots;
use crate::{HistoryPoint, KeywordRecord, KeywordSnapshot, KeywordStore, Language, StoreError};

type Key = (String, Language);

#[derive(Debug, Clone)]
struct StoredRanking {
    position: i32,
    previous_position: Option<i32>,
    search_volume: Option<i32>,
    url: String,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    rankings: HashMap<Key, StoredRanking>,
    history: HashMap<Key, BTreeMap<NaiveDate, i32>>,
}

#[derive(Debug, Default)]
pub struct MemoryKeywordStore {
    tables: Mutex<Tables>,
}

impl MemoryKeywordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch as if it were written at `at`. The whole batch is applied
    /// under one lock, so it is atomic with respect to concurrent callers.
    /// Keywords and URLs are stored trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a malformed batch (nothing is
    /// written), or [`StoreError::Backend`] if the lock is poisoned.
    pub fn upsert_at(
        &self,
        snapshots: &[KeywordSnapshot],
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        validate_snapshots(snapshots)?;

        let mut tables = self.lock()?;
        for snapshot in snapshots {
            let key = (snapshot.keyword.trim().to_string(), snapshot.language);
            let previous_position = tables.rankings.get(&key).map(|r| r.position);

            tables.rankings.insert(
                key.clone(),
                StoredRanking {
                    position: snapshot.position,
                    previous_position,
                    search_volume: snapshot.search_volume,
                    url: snapshot.url.trim().to_string(),
                    last_updated: at,
                },
            );
            tables
                .history
                .entry(key)
                .or_default()
                .insert(at.date_naive(), snapshot.position);
        }

        Ok(snapshots.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::backend("memory keyword store lock poisoned"))
    }
}

#[async_trait]
impl KeywordStore for MemoryKeywordStore {
    async fn upsert(&self, snapshots: &[KeywordSnapshot]) -> Result<usize, StoreError> {
        self.upsert_at(snapshots, Utc::now())
    }

    async fn get_all(&self, language: Option<Language>) -> Result<Vec<KeywordRecord>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .rankings
            .iter()
            .filter(|((_, lang), _)| language.is_none_or(|wanted| wanted == *lang))
            .map(|((keyword, lang), stored)| {
                KeywordRecord::new(
                    keyword.clone(),
                    *lang,
                    stored.position,
                    stored.previous_position,
                    stored.search_volume,
                    stored.url.clone(),
                    stored.last_updated,
                )
            })
            .collect())
    }

    async fn get_history(
        &self,
        keyword: &str,
        language: Language,
        since: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, StoreError> {
        let tables = self.lock()?;
        let Some(days) = tables.history.get(&(keyword.trim().to_string(), language)) else {
            return Ok(Vec::new());
        };
        Ok(days
            .range(since..)
            .map(|(date, position)| HistoryPoint {
                date: *date,
                position: *position,
            })
            .collect())
    }
}

//! Database operations for `keyword_rankings` and `keyword_ranking_history`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rankwatch_core::{
    validate_snapshots, HistoryPoint, KeywordRecord, KeywordSnapshot, KeywordStore, Language,
    StoreError,
};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `keyword_rankings` table.
///
/// `language` is stored as its two-letter code and parsed back on read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordRankingRow {
    pub keyword: String,
    pub language: String,
    pub position: i32,
    /// `NULL` until the keyword has been ranked at least twice.
    pub previous_position: Option<i32>,
    pub search_volume: Option<i32>,
    pub url: String,
    pub last_updated: DateTime<Utc>,
}

impl TryFrom<KeywordRankingRow> for KeywordRecord {
    type Error = DbError;

    fn try_from(row: KeywordRankingRow) -> Result<Self, Self::Error> {
        let language = row
            .language
            .parse::<Language>()
            .map_err(|e| DbError::InvalidRow(e.to_string()))?;
        Ok(KeywordRecord::new(
            row.keyword,
            language,
            row.position,
            row.previous_position,
            row.search_volume,
            row.url,
            row.last_updated,
        ))
    }
}

/// A row from `keyword_ranking_history`, projected to date and position.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct KeywordHistoryRow {
    pub snapshot_date: NaiveDate,
    pub position: i32,
}

impl From<KeywordHistoryRow> for HistoryPoint {
    fn from(row: KeywordHistoryRow) -> Self {
        HistoryPoint {
            date: row.snapshot_date,
            position: row.position,
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Upserts a batch of snapshots inside one transaction.
///
/// Each statement rotates the existing `position` into `previous_position`
/// on conflict, so the old value is read and replaced under the row lock.
/// The same statement writes the day's history point; a second import on the
/// same day overwrites that point. Snapshots are applied in batch order, so a
/// key repeated within one batch sees the earlier entry as its previous value.
///
/// Returns the number of snapshots written.
///
/// # Errors
///
/// Returns [`DbError::Validation`] if any snapshot is malformed (nothing is
/// written), or [`DbError::Sqlx`] if a statement fails (the transaction is
/// rolled back).
pub async fn upsert_keyword_rankings(
    pool: &PgPool,
    snapshots: &[KeywordSnapshot],
    at: DateTime<Utc>,
) -> Result<usize, DbError> {
    validate_snapshots(snapshots)?;
    if snapshots.is_empty() {
        return Ok(0);
    }

    let snapshot_date = at.date_naive();
    let mut tx = pool.begin().await?;

    for snapshot in snapshots {
        sqlx::query(
            "WITH upserted AS ( \
                 INSERT INTO keyword_rankings \
                     (keyword, language, position, previous_position, search_volume, url, last_updated) \
                 VALUES ($1, $2, $3, NULL, $4, $5, $6) \
                 ON CONFLICT (keyword, language) DO UPDATE SET \
                     previous_position = keyword_rankings.position, \
                     position          = EXCLUDED.position, \
                     search_volume     = EXCLUDED.search_volume, \
                     url               = EXCLUDED.url, \
                     last_updated      = EXCLUDED.last_updated \
                 RETURNING id, position \
             ) \
             INSERT INTO keyword_ranking_history (keyword_id, snapshot_date, position) \
             SELECT id, $7, position FROM upserted \
             ON CONFLICT (keyword_id, snapshot_date) DO UPDATE SET \
                 position    = EXCLUDED.position, \
                 recorded_at = NOW()",
        )
        .bind(snapshot.keyword.trim())
        .bind(snapshot.language.code())
        .bind(snapshot.position)
        .bind(snapshot.search_volume)
        .bind(snapshot.url.trim())
        .bind(at)
        .bind(snapshot_date)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::debug!(count = snapshots.len(), "keyword rankings upserted");

    Ok(snapshots.len())
}

/// Returns all live rankings, optionally filtered to one language, ordered by
/// language then keyword.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored language code is not recognised.
pub async fn list_keyword_rankings(
    pool: &PgPool,
    language: Option<Language>,
) -> Result<Vec<KeywordRecord>, DbError> {
    let rows = sqlx::query_as::<_, KeywordRankingRow>(
        "SELECT keyword, language, position, previous_position, search_volume, url, last_updated \
         FROM keyword_rankings \
         WHERE ($1::text IS NULL OR language = $1) \
         ORDER BY language, keyword",
    )
    .bind(language.map(Language::code))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(KeywordRecord::try_from).collect()
}

/// Returns daily positions for one keyword since `since` (inclusive), oldest first.
///
/// An untracked keyword yields an empty list.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keyword_history(
    pool: &PgPool,
    keyword: &str,
    language: Language,
    since: NaiveDate,
) -> Result<Vec<HistoryPoint>, DbError> {
    let rows = sqlx::query_as::<_, KeywordHistoryRow>(
        "SELECT h.snapshot_date, h.position \
         FROM keyword_ranking_history h \
         JOIN keyword_rankings k ON k.id = h.keyword_id \
         WHERE k.keyword = $1 AND k.language = $2 AND h.snapshot_date >= $3 \
         ORDER BY h.snapshot_date",
    )
    .bind(keyword.trim())
    .bind(language.code())
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(HistoryPoint::from).collect())
}

// ---------------------------------------------------------------------------
// KeywordStore implementation
// ---------------------------------------------------------------------------

/// Postgres-backed [`KeywordStore`].
#[derive(Debug, Clone)]
pub struct PgKeywordStore {
    pool: PgPool,
}

impl PgKeywordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl KeywordStore for PgKeywordStore {
    async fn upsert(&self, snapshots: &[KeywordSnapshot]) -> Result<usize, StoreError> {
        Ok(upsert_keyword_rankings(&self.pool, snapshots, Utc::now()).await?)
    }

    async fn get_all(&self, language: Option<Language>) -> Result<Vec<KeywordRecord>, StoreError> {
        Ok(list_keyword_rankings(&self.pool, language).await?)
    }

    async fn get_history(
        &self,
        keyword: &str,
        language: Language,
        since: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, StoreError> {
        Ok(list_keyword_history(&self.pool, keyword, language, since).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

//! The two recurring jobs: refresh rankings from the rank provider, and
//! evaluate and mail movement alerts. Shared by the cron HTTP triggers and
//! the in-process scheduler.

use std::sync::Arc;

use rankwatch_core::{
    dispatch, evaluate_alerts, AlertThreshold, DispatchError, DispatchOutcome, KeywordStore,
    MailSender, RankSource, RankSourceError, StoreError, TrackedKeyword,
};
use thiserror::Error;

/// Collaborators and settings the jobs run against.
pub struct JobContext {
    pub store: Arc<dyn KeywordStore>,
    pub mailer: Arc<dyn MailSender>,
    /// `None` when no rank provider is configured.
    pub rank_source: Option<Arc<dyn RankSource>>,
    pub tracked: Vec<TrackedKeyword>,
    pub alert_threshold: AlertThreshold,
    pub alert_recipients: Vec<String>,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    RankSource(#[from] RankSourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Fetch current positions for every tracked keyword and upsert them.
///
/// Returns the number of keywords updated.
///
/// # Errors
///
/// Returns [`JobError::NotConfigured`] without a rank provider, or the
/// provider's or store's failure. A failed upsert leaves the store untouched.
pub async fn run_rank_update(ctx: &JobContext) -> Result<usize, JobError> {
    let source = ctx
        .rank_source
        .as_ref()
        .ok_or(JobError::NotConfigured("rank provider"))?;

    if ctx.tracked.is_empty() {
        tracing::info!("no tracked keywords; skipping rank update");
        return Ok(0);
    }

    let snapshots = source.fetch_rankings(&ctx.tracked).await?;
    if snapshots.is_empty() {
        tracing::warn!(
            tracked = ctx.tracked.len(),
            "rank provider returned no ranked keywords"
        );
        return Ok(0);
    }

    let updated = ctx.store.upsert(&snapshots).await?;
    tracing::info!(
        tracked = ctx.tracked.len(),
        updated,
        "keyword rankings refreshed"
    );
    Ok(updated)
}

/// Evaluate alerts at the configured threshold and mail one digest.
///
/// # Errors
///
/// Returns the store's failure, or the dispatch failure. Dispatch is not
/// retried; the next run recomputes the same alerts.
pub async fn run_keyword_alerts(ctx: &JobContext) -> Result<DispatchOutcome, JobError> {
    let alerts = evaluate_alerts(ctx.store.as_ref(), ctx.alert_threshold).await?;
    let outcome = dispatch(ctx.mailer.as_ref(), &alerts, &ctx.alert_recipients).await?;
    Ok(outcome)
}


#[cfg(test)]
mod tests {
    use rankwatch_core::{KeywordSnapshot, Language, MemoryKeywordStore};

    use super::testing::{context, FixedRankSource, RecordingMailer};
    use super::*;

    fn snapshot(position: i32) -> KeywordSnapshot {
        KeywordSnapshot::new("sniper bot", Language::En, position, "https://x/y")
    }

    #[tokio::test]
    async fn rank_update_requires_a_rank_source() {
        let ctx = context(
            Arc::new(MemoryKeywordStore::new()),
            Arc::new(RecordingMailer::default()),
            None,
        );
        let err = run_rank_update(&ctx).await.unwrap_err();
        assert!(matches!(err, JobError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn rank_update_upserts_fetched_snapshots() {
        let store = Arc::new(MemoryKeywordStore::new());
        let source: Arc<dyn RankSource> = Arc::new(FixedRankSource(vec![snapshot(7)]));
        let ctx = context(
            Arc::clone(&store),
            Arc::new(RecordingMailer::default()),
            Some(source),
        );

        assert_eq!(run_rank_update(&ctx).await.unwrap(), 1);
        let records = store.get_all(None).await.unwrap();
        assert_eq!(records[0].position, 7);
    }

    #[tokio::test]
    async fn rank_update_with_no_ranked_results_writes_nothing() {
        let store = Arc::new(MemoryKeywordStore::new());
        let source: Arc<dyn RankSource> = Arc::new(FixedRankSource(Vec::new()));
        let ctx = context(
            Arc::clone(&store),
            Arc::new(RecordingMailer::default()),
            Some(source),
        );

        assert_eq!(run_rank_update(&ctx).await.unwrap(), 0);
        assert!(store.get_all(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keyword_alerts_sends_digest_for_significant_moves() {
        let store = Arc::new(MemoryKeywordStore::new());
        store.upsert(&[snapshot(12)]).await.unwrap();
        store.upsert(&[snapshot(7)]).await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(Arc::clone(&store), Arc::clone(&mailer), None);

        let outcome = run_keyword_alerts(&ctx).await.unwrap();
        assert_eq!(outcome.alerts_sent(), 1);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn keyword_alerts_skips_mail_when_nothing_moved() {
        let store = Arc::new(MemoryKeywordStore::new());
        store.upsert(&[snapshot(12)]).await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let ctx = context(store, Arc::clone(&mailer), None);

        let outcome = run_keyword_alerts(&ctx).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}

//! HTTP client for the rank provider API.
//!
//! Posts the tracked keyword set to `/v1/rankings` in chunks and turns the
//! provider's results into [`KeywordSnapshot`]s. Keywords the provider could
//! not rank are dropped; a missing result URL falls back to the tracked URL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rankwatch_core::{
    FeedConfig, KeywordSnapshot, Language, RankSource, RankSourceError, TrackedKeyword,
};
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::retry::retry_with_backoff;
use crate::types::{RankingResult, RankingsRequest, RankingsResponse, RequestedKeyword};

/// Largest keyword list sent in a single request.
pub const MAX_KEYWORDS_PER_REQUEST: usize = 100;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Client for the rank provider REST API.
pub struct RankFeedClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RankFeedClient {
    /// Creates a client from the configured provider settings.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FeedError::Api`] if the configured URL is invalid.
    pub fn new(config: &FeedConfig, timeout_secs: u64) -> Result<Self, FeedError> {
        Self::with_base_url(&config.api_key, timeout_secs, &config.api_url)
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FeedError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rankwatch/0.1 (keyword-tracking)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FeedError::Api {
            status: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches current positions for `tracked`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Api`] if the provider answers with a non-2xx status
    ///   after retries are exhausted.
    /// - [`FeedError::Http`] on network failure.
    /// - [`FeedError::Deserialize`] if a response does not match the expected shape.
    pub async fn fetch(
        &self,
        tracked: &[TrackedKeyword],
    ) -> Result<Vec<KeywordSnapshot>, FeedError> {
        let mut snapshots = Vec::with_capacity(tracked.len());
        let mut unranked = 0usize;

        for chunk in tracked.chunks(MAX_KEYWORDS_PER_REQUEST) {
            let results = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.request_chunk(chunk)
            })
            .await?;

            let (mut ranked, skipped) = to_snapshots(chunk, results);
            unranked += skipped;
            snapshots.append(&mut ranked);
        }

        tracing::info!(
            requested = tracked.len(),
            ranked = snapshots.len(),
            unranked,
            "rank provider fetch complete"
        );
        Ok(snapshots)
    }

    fn rankings_url(&self) -> Result<Url, FeedError> {
        self.base_url.join("v1/rankings").map_err(|e| FeedError::Api {
            status: 0,
            message: format!("invalid rankings URL: {e}"),
        })
    }

    async fn request_chunk(
        &self,
        chunk: &[TrackedKeyword],
    ) -> Result<Vec<RankingResult>, FeedError> {
        let url = self.rankings_url()?;
        let body = RankingsRequest {
            keywords: chunk
                .iter()
                .map(|t| RequestedKeyword {
                    keyword: &t.keyword,
                    language: t.language,
                })
                .collect(),
        };

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: RankingsResponse =
            serde_json::from_str(&text).map_err(|e| FeedError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        Ok(parsed.results)
    }
}

/// Match provider results back to the tracked keywords that were requested.
/// Returns the snapshots plus the number of results that were dropped.
fn to_snapshots(
    requested: &[TrackedKeyword],
    results: Vec<RankingResult>,
) -> (Vec<KeywordSnapshot>, usize) {
    let by_key: HashMap<(String, Language), &TrackedKeyword> = requested
        .iter()
        .map(|t| ((t.keyword.to_lowercase(), t.language), t))
        .collect();

    let mut snapshots = Vec::with_capacity(results.len());
    let mut skipped = 0usize;

    for result in results {
        let Some(tracked) = by_key.get(&(result.keyword.to_lowercase(), result.language)) else {
            tracing::debug!(
                keyword = %result.keyword,
                language = %result.language,
                "ignoring untracked keyword in provider response"
            );
            skipped += 1;
            continue;
        };
        let Some(position) = result.position.filter(|p| *p >= 1) else {
            skipped += 1;
            continue;
        };

        let url = landing_url(result.url.as_deref(), tracked);
        snapshots.push(KeywordSnapshot {
            keyword: tracked.keyword.clone(),
            language: tracked.language,
            position,
            search_volume: result.search_volume.filter(|v| *v >= 0),
            url,
        });
    }

    (snapshots, skipped)
}

/// The provider's landing URL when it is an absolute http(s) URL, otherwise
/// the tracked URL. One malformed result must not invalidate the whole batch.
fn landing_url(reported: Option<&str>, tracked: &TrackedKeyword) -> String {
    let Some(raw) = reported.map(str::trim).filter(|u| !u.is_empty()) else {
        return tracked.url.clone();
    };

    match Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            parsed.into()
        }
        _ => {
            tracing::warn!(
                keyword = %tracked.keyword,
                language = %tracked.language,
                reported = raw,
                "provider returned an unusable url; using the tracked url"
            );
            tracked.url.clone()
        }
    }
}

#[async_trait]
impl RankSource for RankFeedClient {
    async fn fetch_rankings(
        &self,
        keywords: &[TrackedKeyword],
    ) -> Result<Vec<KeywordSnapshot>, RankSourceError> {
        self.fetch(keywords)
            .await
            .map_err(|e| RankSourceError(Box::new(e)))
    }
}

//! Wire types for the rank provider's `/v1/rankings` endpoint.

use rankwatch_core::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct RankingsRequest<'a> {
    pub keywords: Vec<RequestedKeyword<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestedKeyword<'a> {
    pub keyword: &'a str,
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RankingsResponse {
    #[serde(default)]
    pub results: Vec<RankingResult>,
}

/// One provider result. `position` is `null` when the keyword is not ranked
/// within the provider's crawl depth.
#[derive(Debug, Deserialize)]
pub(crate) struct RankingResult {
    pub keyword: String,
    pub language: Language,
    pub position: Option<i32>,
    #[serde(default)]
    pub search_volume: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
}

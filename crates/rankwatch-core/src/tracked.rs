use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::keywords::is_absolute_http_url;
use crate::{ConfigError, KeywordSnapshot, Language, RankSourceError};

/// A keyword the site deliberately tracks, with the page it should rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedKeyword {
    pub keyword: String,
    pub language: Language,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackedKeywordsFile {
    pub keywords: Vec<TrackedKeyword>,
}

impl TrackedKeywordsFile {
    #[must_use]
    pub fn for_language(&self, language: Language) -> Vec<&TrackedKeyword> {
        self.keywords
            .iter()
            .filter(|k| k.language == language)
            .collect()
    }
}

/// The external rank-fetching step: current positions for a set of tracked keywords.
///
/// Keywords the provider could not rank are omitted from the result.
#[async_trait]
pub trait RankSource: Send + Sync {
    async fn fetch_rankings(
        &self,
        keywords: &[TrackedKeyword],
    ) -> Result<Vec<KeywordSnapshot>, RankSourceError>;
}

/// Load and validate the tracked keyword set from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tracked_keywords(path: &Path) -> Result<TrackedKeywordsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: TrackedKeywordsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::KeywordsFileParse)?;

    validate_tracked_keywords(&file)?;

    Ok(file)
}

fn validate_tracked_keywords(file: &TrackedKeywordsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for tracked in &file.keywords {
        if tracked.keyword.trim().is_empty() {
            return Err(ConfigError::KeywordsFileValidation(
                "keyword must be non-empty".to_string(),
            ));
        }

        if !is_absolute_http_url(&tracked.url) {
            return Err(ConfigError::KeywordsFileValidation(format!(
                "keyword '{}' ({}) has invalid url '{}'",
                tracked.keyword, tracked.language, tracked.url
            )));
        }

        if !seen.insert((tracked.keyword.to_lowercase(), tracked.language)) {
            return Err(ConfigError::KeywordsFileValidation(format!(
                "duplicate keyword: '{}' ({})",
                tracked.keyword, tracked.language
            )));
        }
    }

    Ok(())
}

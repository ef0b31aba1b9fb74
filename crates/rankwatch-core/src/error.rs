use thiserror::Error;

/// Boxed source error from a backing store or transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid language: {0}")]
    InvalidLanguage(String),
    #[error("alert threshold must be >= 1, got {0}")]
    InvalidThreshold(i32),
}

/// A keyword snapshot that cannot be stored. `index` is the snapshot's
/// position within the submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("snapshot {index}: keyword must not be empty")]
    EmptyKeyword { index: usize },

    #[error("snapshot {index}: position must be >= 1, got {position}")]
    NonPositivePosition { index: usize, position: i32 },

    #[error("snapshot {index}: url is required")]
    MissingUrl { index: usize },

    #[error("snapshot {index}: url must be an absolute http(s) URL, got '{url}'")]
    InvalidUrl { index: usize, url: String },

    #[error("snapshot {index}: search volume must be >= 0, got {volume}")]
    NegativeSearchVolume { index: usize, volume: i32 },
}

/// Failure reported by a [`crate::KeywordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The batch was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The underlying persistence operation failed; nothing from the batch was applied.
    #[error("keyword store failure: {0}")]
    Backend(#[source] BoxError),
}

impl StoreError {
    pub fn backend(source: impl Into<BoxError>) -> Self {
        Self::Backend(source.into())
    }
}

/// Failure to hand an alert digest to the mail collaborator.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("alert digest has no recipients")]
    NoRecipients,

    #[error("mail transport failed: {0}")]
    Transport(#[source] BoxError),

    #[error("mail service rejected the message (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Failure from the external rank-fetching step.
#[derive(Debug, Error)]
#[error("rank source failure: {0}")]
pub struct RankSourceError(#[source] pub BoxError);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keywords file {path}: {source}")]
    KeywordsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keywords file: {0}")]
    KeywordsFileParse(#[source] serde_yaml::Error),

    #[error("invalid keywords file: {0}")]
    KeywordsFileValidation(String),
}

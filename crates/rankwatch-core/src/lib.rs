//! Domain types and pure logic for keyword rank tracking: snapshots, stored
//! rankings, per-language reports, movement alerts and digest dispatch.

mod alerts;
mod app_config;
mod config;
mod delta;
mod digest;
mod dispatch;
mod error;
mod keywords;
mod language;
mod memory;
mod report;
mod store;
mod tracked;

pub use alerts::{
    alerts_from_records, evaluate_alerts, group_by_language, Alert, AlertThreshold,
    DEFAULT_ALERT_THRESHOLD,
};
pub use app_config::{AppConfig, Environment, FeedConfig, MailConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use delta::compute_change;
pub use digest::{format_change, render_digest, Digest};
pub use dispatch::{dispatch, DispatchOutcome, MailSender, OutboundEmail};
pub use error::{
    BoxError, ConfigError, CoreError, DispatchError, RankSourceError, StoreError, ValidationError,
};
pub use keywords::{validate_snapshots, HistoryPoint, KeywordRecord, KeywordSnapshot};
pub use language::{Language, LanguageMap};
pub use memory::MemoryKeywordStore;
pub use report::{
    build_report, generate_all_reports, generate_report, LanguageSummary, Report, BUCKET_LIMIT,
    OPPORTUNITY_MIN_VOLUME, PODIUM_POSITION, TOP_POSITION,
};
pub use store::KeywordStore;
pub use tracked::{load_tracked_keywords, RankSource, TrackedKeyword, TrackedKeywordsFile};

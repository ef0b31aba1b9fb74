//! Rank provider client: fetches current search positions for the tracked
//! keyword set.

mod client;
mod error;
mod retry;
mod types;

pub use client::{RankFeedClient, MAX_KEYWORDS_PER_REQUEST};
pub use error::FeedError;

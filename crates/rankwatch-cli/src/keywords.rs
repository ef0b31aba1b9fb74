//! Keyword command handlers for the CLI.
//!
//! `import` and `update` write rankings; the remaining subcommands read them
//! back. All of them run after `main` has loaded config and opened the pool.

pub(crate) mod query;

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use rankwatch_core::{AppConfig, KeywordSnapshot, Language, TrackedKeywordsFile};

/// Sub-commands available under `keywords`.
#[derive(Debug, Subcommand)]
pub enum KeywordsCommands {
    /// Import a JSON array of ranking snapshots
    Import {
        /// Path to the JSON file
        file: PathBuf,
        /// Validate the file without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch current positions from the rank provider and store them
    Update {
        /// Fetch and print without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// List stored rankings
    List {
        /// Filter by language (de, en, es, fr, zh)
        #[arg(long)]
        language: Option<Language>,
    },
    /// Print the ranking report for one language
    Report {
        /// Language to report on (de, en, es, fr, zh)
        #[arg(long)]
        language: Language,
    },
    /// Show significant movements, optionally mailing the digest
    Alerts {
        /// Minimum absolute position change; defaults to the configured threshold
        #[arg(long)]
        threshold: Option<i32>,
        /// Send the digest to the configured recipients
        #[arg(long)]
        send: bool,
    },
    /// Show daily position history for one keyword
    History {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        language: Language,
        /// Number of days to show, today included (1-365)
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,
    },
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: KeywordsCommands,
) -> anyhow::Result<()> {
    match command {
        KeywordsCommands::Import { file, dry_run } => run_import(pool, &file, dry_run).await,
        KeywordsCommands::Update { dry_run } => run_update(pool, config, dry_run).await,
        KeywordsCommands::List { language } => query::run_list(pool, language).await,
        KeywordsCommands::Report { language } => query::run_report(pool, language).await,
        KeywordsCommands::Alerts { threshold, send } => {
            query::run_alerts(pool, config, threshold, send).await
        }
        KeywordsCommands::History {
            keyword,
            language,
            days,
        } => query::run_history(pool, &keyword, language, days).await,
    }
}

fn read_snapshots(path: &Path) -> anyhow::Result<Vec<KeywordSnapshot>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let snapshots = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(snapshots)
}

/// Fetched snapshots per language, alongside how many keywords that language
/// tracks. Languages with nothing tracked are omitted.
pub(crate) fn group_ranked<'a>(
    tracked: &TrackedKeywordsFile,
    snapshots: &'a [KeywordSnapshot],
) -> Vec<(Language, usize, Vec<&'a KeywordSnapshot>)> {
    Language::ALL
        .into_iter()
        .filter_map(|language| {
            let tracked_count = tracked.for_language(language).len();
            if tracked_count == 0 {
                return None;
            }
            let ranked = snapshots
                .iter()
                .filter(|s| s.language == language)
                .collect();
            Some((language, tracked_count, ranked))
        })
        .collect()
}

/// Import snapshots from a JSON file.
///
/// The batch is validated up front; an invalid entry aborts the import
/// before anything is written.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a snapshot is
/// invalid, or the upsert fails.
async fn run_import(pool: &sqlx::PgPool, file: &Path, dry_run: bool) -> anyhow::Result<()> {
    let snapshots = read_snapshots(file)?;
    rankwatch_core::validate_snapshots(&snapshots)?;

    if dry_run {
        println!(
            "dry-run: {} snapshot(s) in {} are valid",
            snapshots.len(),
            file.display()
        );
        return Ok(());
    }

    let updated = rankwatch_db::upsert_keyword_rankings(pool, &snapshots, Utc::now()).await?;
    tracing::info!(file = %file.display(), updated, "keyword import complete");
    println!("imported {updated} keyword ranking(s)");
    Ok(())
}

/// Fetch positions for every tracked keyword from the rank provider.
///
/// # Errors
///
/// Returns an error if the provider is not configured, the tracked keywords
/// file cannot be loaded, the fetch fails, or the upsert fails.
async fn run_update(pool: &sqlx::PgPool, config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let feed = config.feed.as_ref().ok_or_else(|| {
        anyhow::anyhow!("RANKWATCH_FEED_API_URL is not set; cannot fetch rankings")
    })?;
    let tracked = rankwatch_core::load_tracked_keywords(&config.keywords_path)?;
    let client = rankwatch_feed::RankFeedClient::new(feed, config.request_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build rank feed client: {e}"))?;

    let snapshots = client.fetch(&tracked.keywords).await?;
    println!(
        "fetched {} ranked keyword(s) of {} tracked",
        snapshots.len(),
        tracked.keywords.len()
    );

    if dry_run {
        for (language, tracked_count, ranked) in group_ranked(&tracked, &snapshots) {
            println!(
                "{language}: {} of {tracked_count} tracked keyword(s) ranked",
                ranked.len()
            );
            for snapshot in ranked {
                println!("    {:<40}{:>5}", snapshot.keyword, snapshot.position);
            }
        }
        return Ok(());
    }

    let updated = rankwatch_db::upsert_keyword_rankings(pool, &snapshots, Utc::now()).await?;
    println!("updated {updated} keyword ranking(s)");
    Ok(())
}

use chrono::{Days, Utc};
use rankwatch_core::{
    alerts_from_records, format_change, render_digest, AlertThreshold, AppConfig, KeywordRecord,
    Language, MailSender,
};

/// Render an optional position, `"\u{2014}"` when absent.
pub(crate) fn fmt_position(position: Option<i32>) -> String {
    position.map_or_else(|| "\u{2014}".to_string(), |p| p.to_string())
}

pub(crate) fn fmt_average(average: Option<f64>) -> String {
    average.map_or_else(|| "\u{2014}".to_string(), |a| format!("{a:.1}"))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

fn print_records(records: &[KeywordRecord]) {
    println!(
        "{:<6}{:<40}{:>6}{:>6}{:>8}{:>9}  URL",
        "LANG", "KEYWORD", "POS", "PREV", "CHANGE", "VOLUME"
    );
    for record in records {
        println!(
            "{:<6}{:<40}{:>6}{:>6}{:>8}{:>9}  {}",
            record.language.code(),
            truncate(&record.keyword, 36),
            record.position,
            fmt_position(record.previous_position),
            format_change(record.change),
            fmt_position(record.search_volume),
            record.url
        );
    }
}

/// List stored rankings, sorted by language then keyword.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_list(
    pool: &sqlx::PgPool,
    language: Option<Language>,
) -> anyhow::Result<()> {
    let records = rankwatch_db::list_keyword_rankings(pool, language).await?;

    if records.is_empty() {
        println!(
            "no keyword rankings found{}; run `keywords import` or `keywords update` first",
            language.map(|l| format!(" for {l}")).unwrap_or_default()
        );
        return Ok(());
    }

    print_records(&records);
    Ok(())
}

/// Print the report sections and summary for one language.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_report(pool: &sqlx::PgPool, language: Language) -> anyhow::Result<()> {
    let store = rankwatch_db::PgKeywordStore::new(pool.clone());
    let report = rankwatch_core::generate_report(&store, language).await?;
    let summary = &report.language_summary;

    println!(
        "# {} keyword report ({})",
        language.display_name(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    println!("total keywords:   {}", summary.total_keywords);
    println!("average position: {}", fmt_average(summary.average_position));
    println!("in top 10:        {}", summary.keywords_in_top10);
    println!("in top 3:         {}", summary.keywords_in_top3);

    for (title, records) in [
        ("Top keywords", &report.top_keywords),
        ("Improving", &report.improving_keywords),
        ("Declining", &report.declining_keywords),
        ("Opportunities", &report.opportunities),
    ] {
        println!();
        println!("## {title}");
        if records.is_empty() {
            println!("(none)");
        } else {
            print_records(records);
        }
    }

    Ok(())
}

/// Show alerts at `threshold` (or the configured one) and optionally mail them.
///
/// Without a mail provider configured, `--send` logs the digest instead.
///
/// # Errors
///
/// Returns an error if the threshold is invalid, the database query fails,
/// or dispatch fails.
pub(crate) async fn run_alerts(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    threshold: Option<i32>,
    send: bool,
) -> anyhow::Result<()> {
    let threshold = match threshold {
        Some(raw) => AlertThreshold::new(raw)?,
        None => config.alert_threshold,
    };

    let records = rankwatch_db::list_keyword_rankings(pool, None).await?;
    let alerts = alerts_from_records(&records, threshold);

    if alerts.is_empty() {
        println!("no keyword moved by {} or more positions", threshold.get());
        return Ok(());
    }

    if !send {
        print!("{}", render_digest(&alerts).text);
        return Ok(());
    }

    let mailer: Box<dyn MailSender> = match &config.mail {
        Some(mail) => Box::new(rankwatch_mailer::HttpMailer::new(
            mail,
            config.request_timeout_secs,
        )?),
        None => {
            tracing::warn!("RANKWATCH_MAIL_API_URL not set; digest will only be logged");
            Box::new(rankwatch_mailer::LogMailSender)
        }
    };
    let outcome =
        rankwatch_core::dispatch(mailer.as_ref(), &alerts, &config.alert_recipients).await?;
    println!(
        "sent digest with {} alert(s) to {} recipient(s)",
        outcome.alerts_sent(),
        config.alert_recipients.len()
    );
    Ok(())
}

/// Show daily positions for one keyword over the last `days` days, today included.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_history(
    pool: &sqlx::PgPool,
    keyword: &str,
    language: Language,
    days: u32,
) -> anyhow::Result<()> {
    let since = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .ok_or_else(|| anyhow::anyhow!("--days {days} is out of range"))?;
    let points = rankwatch_db::list_keyword_history(pool, keyword, language, since).await?;

    if points.is_empty() {
        println!("no history for '{keyword}' ({language}) since {since}");
        return Ok(());
    }

    println!("{:<13}POSITION", "DATE");
    for point in &points {
        println!("{:<13}{}", point.date.format("%Y-%m-%d"), point.position);
    }
    Ok(())
}

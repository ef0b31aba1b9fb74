mod api;
mod jobs;
mod middleware;
mod scheduler;

use std::sync::Arc;

use rankwatch_core::{KeywordStore, MailSender, RankSource};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    jobs::JobContext,
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = rankwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let pool_config = rankwatch_db::PoolConfig::from_app_config(&config);
    let pool = rankwatch_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = rankwatch_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let tracked = rankwatch_core::load_tracked_keywords(&config.keywords_path)?;
    tracing::info!(
        count = tracked.keywords.len(),
        path = %config.keywords_path.display(),
        "loaded tracked keywords"
    );

    let store: Arc<dyn KeywordStore> = Arc::new(rankwatch_db::PgKeywordStore::new(pool));
    let mailer: Arc<dyn MailSender> = match &config.mail {
        Some(mail) => Arc::new(rankwatch_mailer::HttpMailer::new(
            mail,
            config.request_timeout_secs,
        )?),
        None => {
            tracing::warn!("RANKWATCH_MAIL_API_URL not set; alert digests will only be logged");
            Arc::new(rankwatch_mailer::LogMailSender)
        }
    };
    let rank_source: Option<Arc<dyn RankSource>> = match &config.feed {
        Some(feed) => Some(Arc::new(rankwatch_feed::RankFeedClient::new(
            feed,
            config.request_timeout_secs,
        )?)),
        None => {
            tracing::warn!("RANKWATCH_FEED_API_URL not set; rank updates are disabled");
            None
        }
    };

    let jobs = Arc::new(JobContext {
        store,
        mailer,
        rank_source,
        tracked: tracked.keywords,
        alert_threshold: config.alert_threshold,
        alert_recipients: config.alert_recipients.clone(),
    });

    let _scheduler = if config.scheduler_enabled {
        Some(scheduler::build_scheduler(Arc::clone(&jobs), &config).await?)
    } else {
        tracing::info!("in-process scheduler disabled; relying on cron triggers");
        None
    };

    let admin_auth =
        AuthState::from_tokens("admin", &config.admin_api_keys, config.is_development())?;
    let cron_secret: Vec<&str> = config.cron_secret.as_deref().into_iter().collect();
    let cron_auth = AuthState::from_tokens("cron", &cron_secret, config.is_development())?;
    let app = build_app(AppState { jobs }, admin_auth, cron_auth, default_rate_limit_state());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "rankwatch server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

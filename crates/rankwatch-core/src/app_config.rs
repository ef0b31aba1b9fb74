use std::net::SocketAddr;
use std::path::PathBuf;

use crate::AlertThreshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Outbound mail API settings.
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

/// Rank provider API settings.
#[derive(Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub keywords_path: PathBuf,
    /// Shared secret the scheduled triggers must present.
    pub cron_secret: Option<String>,
    /// Bearer tokens accepted on admin routes.
    pub admin_api_keys: Vec<String>,
    pub alert_threshold: AlertThreshold,
    pub alert_recipients: Vec<String>,
    pub mail: Option<MailConfig>,
    pub feed: Option<FeedConfig>,
    pub request_timeout_secs: u64,
    pub scheduler_enabled: bool,
    pub update_cron: String,
    pub alert_cron: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[redacted]")
            .field("from", &self.from)
            .finish()
    }
}

impl std::fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("keywords_path", &self.keywords_path)
            .field("database_url", &"[redacted]")
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[redacted]"))
            .field("admin_api_keys", &format!("[{} redacted]", self.admin_api_keys.len()))
            .field("alert_threshold", &self.alert_threshold.get())
            .field("alert_recipients", &self.alert_recipients)
            .field("mail", &self.mail)
            .field("feed", &self.feed)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("scheduler_enabled", &self.scheduler_enabled)
            .field("update_cron", &self.update_cron)
            .field("alert_cron", &self.alert_cron)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

use crate::app_config::{AppConfig, Environment, FeedConfig, MailConfig};
use crate::{AlertThreshold, ConfigError};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function,
/// so parsing can be tested against a plain `HashMap`.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("RANKWATCH_ENV", "development"))?;

    let bind_addr = or_default("RANKWATCH_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("RANKWATCH_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("RANKWATCH_LOG_LEVEL", "info");
    let keywords_path = PathBuf::from(or_default(
        "RANKWATCH_KEYWORDS_PATH",
        "./config/keywords.yaml",
    ));

    let cron_secret = optional("RANKWATCH_CRON_SECRET");
    let admin_api_keys = split_list(&or_default("RANKWATCH_ADMIN_API_KEYS", ""));
    if env != Environment::Development {
        if cron_secret.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "RANKWATCH_CRON_SECRET".to_string(),
            ));
        }
        if admin_api_keys.is_empty() {
            return Err(ConfigError::MissingEnvVar(
                "RANKWATCH_ADMIN_API_KEYS".to_string(),
            ));
        }
    }

    let raw_threshold = or_default("RANKWATCH_ALERT_THRESHOLD", "5");
    let alert_threshold = raw_threshold
        .trim()
        .parse::<i32>()
        .map_err(|e| e.to_string())
        .and_then(|v| AlertThreshold::new(v).map_err(|e| e.to_string()))
        .map_err(|reason| invalid("RANKWATCH_ALERT_THRESHOLD", reason))?;

    let alert_recipients = split_list(&or_default("RANKWATCH_ALERT_RECIPIENTS", ""));
    if let Some(bad) = alert_recipients.iter().find(|r| !r.contains('@')) {
        return Err(invalid(
            "RANKWATCH_ALERT_RECIPIENTS",
            format!("'{bad}' is not an email address"),
        ));
    }

    let mail = match (
        optional("RANKWATCH_MAIL_API_URL"),
        optional("RANKWATCH_MAIL_API_KEY"),
        optional("RANKWATCH_MAIL_FROM"),
    ) {
        (Some(api_url), Some(api_key), Some(from)) => Some(MailConfig {
            api_url,
            api_key,
            from,
        }),
        (None, None, None) => None,
        _ => {
            return Err(invalid(
                "RANKWATCH_MAIL_API_URL",
                "RANKWATCH_MAIL_API_URL, RANKWATCH_MAIL_API_KEY and RANKWATCH_MAIL_FROM must be set together".to_string(),
            ))
        }
    };

    let feed = match (
        optional("RANKWATCH_FEED_API_URL"),
        optional("RANKWATCH_FEED_API_KEY"),
    ) {
        (Some(api_url), Some(api_key)) => Some(FeedConfig { api_url, api_key }),
        (None, None) => None,
        _ => {
            return Err(invalid(
                "RANKWATCH_FEED_API_URL",
                "RANKWATCH_FEED_API_URL and RANKWATCH_FEED_API_KEY must be set together"
                    .to_string(),
            ))
        }
    };

    let request_timeout_secs = parse_u64("RANKWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let scheduler_enabled = parse_bool("RANKWATCH_SCHEDULER_ENABLED", "false")?;
    let update_cron = or_default("RANKWATCH_UPDATE_CRON", "0 0 6 * * *");
    let alert_cron = or_default("RANKWATCH_ALERT_CRON", "0 30 6 * * *");

    let db_max_connections = parse_u32("RANKWATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RANKWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RANKWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        keywords_path,
        cron_secret,
        admin_api_keys,
        alert_threshold,
        alert_recipients,
        mail,
        feed,
        request_timeout_secs,
        scheduler_enabled,
        update_cron,
        alert_cron,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RANKWATCH_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

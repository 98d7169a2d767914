use anyhow::Context;
use std::time::Duration;

use crate::booking::payment::DEFAULT_PAYMENT_DELAY;
use crate::search::DEFAULT_SEARCH_DELAY;
use crate::sessions::DEFAULT_SESSION_TTL;

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub payment_delay: Duration,
    pub search_delay: Duration,
    pub session_ttl: Duration,
    /// Frontend origin to whitelist for CORS. `None` allows any origin.
    pub webapp_url: Option<String>,
    /// Where ERROR-level log events are forwarded, if set.
    pub alert_webhook_url: Option<String>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn millis_var(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match var(name) {
        Some(v) => {
            let ms: u64 = v
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds", name))?;
            Ok(Duration::from_millis(ms))
        }
        None => Ok(default),
    }
}

fn url_var(name: &str) -> anyhow::Result<Option<String>> {
    match var(name) {
        Some(v) => {
            url::Url::parse(&v).with_context(|| format!("{} must be a valid URL", name))?;
            Ok(Some(v.trim_end_matches('/').to_string()))
        }
        None => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let session_secret = var("SESSION_SECRET").context("SESSION_SECRET must be set")?;

        let port = match var("PORT") {
            Some(p) => p.parse().context("PORT must be a number")?,
            None => 3000,
        };

        let session_ttl = match var("SESSION_TTL_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .context("SESSION_TTL_SECS must be a number of seconds")?,
            ),
            None => DEFAULT_SESSION_TTL,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:careflow.db?mode=rwc".into()),
            session_secret,
            payment_delay: millis_var("PAYMENT_DELAY_MS", DEFAULT_PAYMENT_DELAY)?,
            search_delay: millis_var("SEARCH_DELAY_MS", DEFAULT_SEARCH_DELAY)?,
            session_ttl,
            webapp_url: url_var("WEBAPP_URL")?,
            alert_webhook_url: url_var("ALERT_WEBHOOK_URL")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Tests ──

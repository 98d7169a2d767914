mod alert_layer;
mod auth;
mod booking;
mod catalog;
mod config;
mod db;
mod handlers;
mod models;
mod rate_limit;
mod search;
mod sessions;

use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use auth::SessionSigner;
use booking::{SimulatedGateway, TicketIdGenerator};
use config::Config;
use rate_limit::RateLimiter;
use sessions::SessionStore;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// Ledger of confirmed tickets. Drafts never touch the database.
    pub db: sqlx::SqlitePool,
    pub sessions: SessionStore,
    pub signer: SessionSigner,
    pub gateway: SimulatedGateway,
    pub ticket_ids: TicketIdGenerator,
    pub search_delay: Duration,
    pub started_at: Instant,
}

/// Idle session sweep interval (seconds).
const SESSION_CLEANUP_SECS: u64 = 60;
/// Rate limit cleanup interval (seconds).
const RATE_LIMIT_CLEANUP_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // ── Config (read before tracing so the alert layer can use it) ──
    let config = Config::from_env()?;

    // ── Tracing: console + optional webhook alerts on errors ──
    let env_filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    let fmt_layer = tracing_subscriber::fmt::layer();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    match &config.alert_webhook_url {
        Some(url) => registry
            .with(alert_layer::AlertLayer::new(url.clone()))
            .init(),
        None => registry.init(),
    }

    if config.payment_delay.is_zero() {
        tracing::warn!("PAYMENT_DELAY_MS is 0: payments confirm instantly");
    }

    // ── Database ──
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    db::run_migrations(&pool).await?;

    let state = Arc::new(AppState {
        db: pool,
        sessions: SessionStore::new(),
        signer: SessionSigner::new(config.session_secret.as_bytes()),
        gateway: SimulatedGateway::new(config.payment_delay),
        ticket_ids: TicketIdGenerator::new(),
        search_delay: config.search_delay,
        started_at: Instant::now(),
    });

    // ── Background task: drop abandoned drafts ──
    let sweep_state = state.clone();
    let session_ttl = config.session_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SESSION_CLEANUP_SECS));
        loop {
            interval.tick().await;
            let dropped = sweep_state.sessions.cleanup(session_ttl);
            if dropped > 0 {
                tracing::info!("Dropped {} idle booking sessions", dropped);
            }
        }
    });

    // ── Rate limiter ──
    let rate_limiter = RateLimiter::with_default_tiers();

    // ── Background task: cleanup stale rate limit entries ──
    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_LIMIT_CLEANUP_SECS));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    // ── CORS: whitelist WEBAPP_URL when configured, otherwise allow any ──
    let cors = match &config.webapp_url {
        Some(webapp_url) => {
            let origins: Vec<axum::http::HeaderValue> = vec![
                webapp_url
                    .parse()
                    .context("WEBAPP_URL is not a valid origin")?,
                axum::http::HeaderValue::from_static("http://localhost:5173"), // Vite dev server
            ];
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = handlers::router(state, rate_limiter)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.addr();
    tracing::info!("Careflow server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::ApiResponse;

/// Route groups with separate budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Catalog, search and ticket reads.
    Public,
    /// Wizard interaction: draft updates, navigation.
    Flow,
    /// Payment triggers.
    Payment,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Public => "public",
            Tier::Flow => "flow",
            Tier::Payment => "payment",
        }
    }
}

/// Sliding window budget for one tier.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

type TierMap = DashMap<Tier, (RateLimitConfig, DashMap<IpAddr, Vec<Instant>>)>;

/// Per-IP sliding window limiter. Tiers without a config are unlimited.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    tiers: Arc<TierMap>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Budgets used by the server.
    pub fn with_default_tiers() -> Self {
        let limiter = Self::new();
        limiter.add_tier(
            Tier::Public,
            RateLimitConfig {
                max_requests: 60,
                window: Duration::from_secs(60),
            },
        );
        limiter.add_tier(
            Tier::Flow,
            RateLimitConfig {
                max_requests: 120,
                window: Duration::from_secs(60),
            },
        );
        limiter.add_tier(
            Tier::Payment,
            RateLimitConfig {
                max_requests: 5,
                window: Duration::from_secs(300),
            },
        );
        limiter
    }

    pub fn add_tier(&self, tier: Tier, config: RateLimitConfig) {
        self.tiers.insert(tier, (config, DashMap::new()));
    }

    /// `Ok(())` if allowed, `Err(retry_after_secs)` if limited.
    pub fn check(&self, tier: Tier, ip: IpAddr) -> Result<(), u64> {
        let Some(tier_entry) = self.tiers.get(&tier) else {
            return Ok(());
        };
        let (config, ip_map) = tier_entry.value();
        let now = Instant::now();

        let mut entry = ip_map.entry(ip).or_default();
        entry.retain(|t| now.duration_since(*t) < config.window);

        if entry.len() >= config.max_requests as usize {
            let oldest = entry[0];
            let retry_after = (oldest + config.window)
                .saturating_duration_since(now)
                .as_secs()
                .max(1);
            return Err(retry_after);
        }

        entry.push(now);
        Ok(())
    }

    /// Remove entries older than twice their window. Run periodically.
    pub fn cleanup(&self) {
        let now = Instant::now();
        for tier_entry in self.tiers.iter() {
            let (config, ip_map) = tier_entry.value();
            let cutoff = config.window * 2;
            ip_map.retain(|_ip, timestamps| {
                timestamps.retain(|t| now.duration_since(*t) < cutoff);
                !timestamps.is_empty()
            });
        }
    }
}

// ── IP Extraction ──

/// First X-Forwarded-For address (reverse proxy), else the socket peer.
pub fn extract_client_ip(req: &Request) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first_ip) = forwarded.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn too_many_requests(retry_after: u64) -> Response {
    let body = ApiResponse::<()>::error(format!(
        "Too many requests. Try again in {} seconds",
        retry_after
    ));
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        Json(body),
    )
        .into_response()
}

fn enforce(limiter: &RateLimiter, tier: Tier, req: &Request) -> Result<(), Response> {
    let ip = extract_client_ip(req);
    limiter.check(tier, ip).map_err(|retry_after| {
        tracing::warn!(tier = tier.as_str(), %ip, "rate limited");
        too_many_requests(retry_after)
    })
}

// ── Middleware (one per tier) ──

pub async fn rate_limit_public(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&limiter, Tier::Public, &req)?;
    Ok(next.run(req).await)
}

pub async fn rate_limit_flow(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&limiter, Tier::Flow, &req)?;
    Ok(next.run(req).await)
}

pub async fn rate_limit_payment(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&limiter, Tier::Payment, &req)?;
    Ok(next.run(req).await)
}

// ── Tests ──

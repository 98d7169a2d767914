pub mod booking;
pub mod catalog;
pub mod health;
pub mod tickets;

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;

use crate::models::ApiResponse;
use crate::rate_limit::{rate_limit_flow, rate_limit_payment, rate_limit_public, RateLimiter};
use crate::AppState;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::error(msg)))
}

/// All API routes, grouped by rate limit tier. CORS and request tracing are
/// layered on by the caller.
pub fn router(state: Arc<AppState>, limiter: RateLimiter) -> Router {
    // 1. No limit: health checks
    let no_limit_routes = Router::new().route("/api/health", get(health::health));

    // 2. Public: catalog, search, ticket ledger (60 req/min)
    let public_routes = Router::new()
        .route("/api/flows", get(catalog::list_flows))
        .route("/api/listings/{kind}", get(catalog::list_listings))
        .route("/api/search/{kind}", get(catalog::search_listings))
        .route("/api/payment-methods", get(catalog::list_payment_methods))
        .route("/api/tickets", get(tickets::list_tickets))
        .route("/api/tickets/{ticket_id}", get(tickets::get_ticket))
        .layer(from_fn_with_state(limiter.clone(), rate_limit_public));

    // 3. Flow: wizard interaction (120 req/min)
    let flow_routes = Router::new()
        .route("/api/bookings", post(booking::start_booking))
        .route(
            "/api/bookings/{handle}",
            get(booking::get_booking).delete(booking::discard_booking),
        )
        .route("/api/bookings/{handle}/draft", patch(booking::update_draft))
        .route("/api/bookings/{handle}/advance", post(booking::advance))
        .route("/api/bookings/{handle}/retreat", post(booking::retreat))
        .layer(from_fn_with_state(limiter.clone(), rate_limit_flow));

    // 4. Payment: strictest limit (5 req/5min)
    let payment_routes = Router::new()
        .route("/api/bookings/{handle}/pay", post(booking::pay))
        .layer(from_fn_with_state(limiter, rate_limit_payment));

    Router::new()
        .merge(no_limit_routes)
        .merge(public_routes)
        .merge(flow_routes)
        .merge(payment_routes)
        .with_state(state)
}

// ── Tests ──

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    booking::{FlowKind, PaymentMethodDescriptor},
    catalog::{self, Listing},
    models::*,
    search::{self, SearchQuery},
    AppState,
};

use super::{api_error, ApiError};

fn parse_kind(kind: &str) -> Result<FlowKind, ApiError> {
    FlowKind::parse(kind)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown booking flow: {}", kind)))
}

/// GET /api/flows — step tables and fees for every booking flow.
pub async fn list_flows() -> Json<ApiResponse<Vec<FlowSummary>>> {
    let flows = FlowKind::ALL
        .into_iter()
        .map(|kind| FlowSummary {
            kind,
            steps: kind.steps(),
            fees: kind.fees(),
        })
        .collect();
    Json(ApiResponse::success(flows))
}

/// GET /api/listings/{kind}
pub async fn list_listings(
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<Vec<Listing>>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ApiResponse::success(catalog::listings(kind))))
}

/// GET /api/search/{kind}?q=...&location=...&max_fee=...
///
/// Waits the configured search delay before answering.
pub async fn search_listings(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Listing>>>, ApiError> {
    let kind = parse_kind(&kind)?;

    if !state.search_delay.is_zero() {
        tokio::time::sleep(state.search_delay).await;
    }

    let found = search::filter_listings(catalog::listings(kind), &query);
    Ok(Json(ApiResponse::success(found)))
}

/// GET /api/payment-methods
pub async fn list_payment_methods() -> Json<ApiResponse<&'static [PaymentMethodDescriptor]>> {
    Json(ApiResponse::success(catalog::payment_methods()))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    db::{self, TicketRecord},
    models::*,
    AppState,
};

use super::{api_error, ApiError};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("Ticket ledger query failed: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

/// GET /api/tickets?limit=N — confirmed tickets, newest first.
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TicketsQuery>,
) -> Result<Json<ApiResponse<Vec<TicketRecord>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rows = db::list_tickets(&state.db, limit).await.map_err(internal)?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /api/tickets/{ticket_id}
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<ApiResponse<TicketRecord>>, ApiError> {
    let row = db::find_ticket(&state.db, &ticket_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Ticket not found"))?;
    Ok(Json(ApiResponse::success(row)))
}

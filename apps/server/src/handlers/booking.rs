use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    booking::{payment, BookingFlow, DraftUpdate, FlowError, FlowKind},
    catalog::{self, Listing},
    db,
    models::*,
    sessions::SharedFlow,
    AppState,
};

use super::{api_error, ApiError};

/// Map a refused flow operation to an HTTP error.
fn flow_error(e: FlowError) -> ApiError {
    let status = match e {
        FlowError::MissingFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FlowError::PaymentInProgress
        | FlowError::AlreadyConfirmed
        | FlowError::NotAtPaymentStep
        | FlowError::NoPaymentInFlight => StatusCode::CONFLICT,
    };
    api_error(status, e.to_string())
}

/// Verify the handle and fetch its flow.
fn resolve(state: &AppState, handle: &str) -> Result<(String, SharedFlow), ApiError> {
    let not_found = || api_error(StatusCode::NOT_FOUND, "Booking session not found");
    let id = state.signer.verify(handle).ok_or_else(not_found)?;
    let flow = state.sessions.get(id).ok_or_else(not_found)?;
    Ok((id.to_string(), flow))
}

fn session_view(handle: String, flow: &BookingFlow<Listing>) -> SessionView {
    SessionView {
        handle,
        flow: flow.view(catalog::payment_methods()),
    }
}

/// Reject values the booking pages never offer: unknown or unavailable
/// payment methods and visit types the provider does not support.
/// The draft itself accepts anything.
fn check_offered(listing: &Listing, updates: &[DraftUpdate]) -> Result<(), ApiError> {
    for update in updates {
        match update {
            DraftUpdate::PaymentMethod(Some(id)) => {
                let method = catalog::find_payment_method(id).ok_or_else(|| {
                    api_error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("Unknown payment method: {}", id),
                    )
                })?;
                if !method.available {
                    return Err(api_error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("Payment method is not available: {}", method.name),
                    ));
                }
            }
            DraftUpdate::VisitType(Some(visit_type)) => {
                if !listing.visit_types().contains(visit_type) {
                    return Err(api_error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "Visit type is not offered by this provider",
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// POST /api/bookings — start a booking flow for a listing.
pub async fn start_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionView>>), ApiError> {
    let kind = FlowKind::parse(&body.kind).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown booking flow: {}", body.kind),
        )
    })?;

    let listing = catalog::find_listing(kind, &body.service_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Provider not found"))?;

    if !listing.available() {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Provider is not accepting bookings",
        ));
    }

    let (id, handle) = state.signer.issue();
    let flow = BookingFlow::new(kind, listing);
    let view = session_view(handle, &flow);
    state.sessions.insert(id.clone(), flow);

    tracing::info!(
        session = %id,
        kind = kind.as_str(),
        service = %body.service_id,
        "Booking flow started"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

/// GET /api/bookings/{handle}
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    let (_, flow) = resolve(&state, &handle)?;
    let flow = flow.lock().await;
    Ok(Json(ApiResponse::success(session_view(handle, &flow))))
}

/// PATCH /api/bookings/{handle}/draft — apply field updates in order.
pub async fn update_draft(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
    Json(body): Json<UpdateDraftRequest>,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    let (_, flow) = resolve(&state, &handle)?;
    let mut flow = flow.lock().await;

    flow.ensure_editable().map_err(flow_error)?;
    check_offered(flow.draft().selected_service(), &body.updates)?;
    flow.update(body.updates).map_err(flow_error)?;

    Ok(Json(ApiResponse::success(session_view(handle, &flow))))
}

/// POST /api/bookings/{handle}/advance
///
/// A blocked move is not an error: the response reports it and the step
/// stays where it was.
pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<AdvanceResponse>>, ApiError> {
    let (id, flow) = resolve(&state, &handle)?;
    let mut flow = flow.lock().await;

    let result = flow.advance().map_err(flow_error)?;
    tracing::debug!(session = %id, ?result, "advance");

    Ok(Json(ApiResponse::success(AdvanceResponse {
        result,
        session: session_view(handle, &flow),
    })))
}

/// POST /api/bookings/{handle}/retreat
pub async fn retreat(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<RetreatResponse>>, ApiError> {
    let (_, flow) = resolve(&state, &handle)?;
    let mut flow = flow.lock().await;

    let moved = flow.retreat().map_err(flow_error)?;

    Ok(Json(ApiResponse::success(RetreatResponse {
        moved,
        session: session_view(handle, &flow),
    })))
}

/// POST /api/bookings/{handle}/pay — start the simulated payment.
///
/// Returns 202 right away with `processing: true`; the flow turns
/// `confirmed` once the gateway delay has passed.
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<SessionView>>), ApiError> {
    let (id, shared) = resolve(&state, &handle)?;

    let (request, view, kind) = {
        let mut flow = shared.lock().await;
        let request = flow
            .begin_payment(catalog::payment_methods(), &id)
            .map_err(flow_error)?;
        (request, session_view(handle, &flow), flow.kind())
    };

    let task_state = state.clone();
    tokio::spawn(async move {
        let session_id = request.session_id.clone();

        let result = payment::settle_payment(
            &task_state.gateway,
            &*shared,
            request,
            &task_state.ticket_ids,
        )
        .await;

        if let Ok(ticket) = result {
            if let Err(e) = db::record_ticket(&task_state.db, &session_id, kind, &ticket).await {
                tracing::error!(
                    ticket = %ticket.ticket_id,
                    "Failed to record ticket: {}",
                    e
                );
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(view))))
}

/// DELETE /api/bookings/{handle} — discard the draft.
pub async fn discard_booking(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<ApiResponse<DiscardResponse>>, ApiError> {
    let (id, flow) = resolve(&state, &handle)?;

    // Held across the removal so a concurrent pay cannot start in between.
    // `remove` never locks the flow.
    let flow = flow.lock().await;
    if flow.is_processing() {
        return Err(flow_error(FlowError::PaymentInProgress));
    }

    let discarded = state.sessions.remove(&id);
    drop(flow);
    tracing::info!(session = %id, "Booking flow discarded");

    Ok(Json(ApiResponse::success(DiscardResponse { discarded })))
}

use serde::{Deserialize, Serialize};

use crate::booking::{DraftUpdate, FeeSchedule, FlowKind, FlowView, StepDefinition, StepMove};
use crate::catalog::Listing;

// ── API request/response types ──

#[derive(Debug, Deserialize)]
pub struct StartBookingRequest {
    pub kind: String,
    pub service_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    pub updates: Vec<DraftUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct TicketsQuery {
    pub limit: Option<i64>,
}

/// A booking session as returned to the client.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// Opaque handle for all further calls on this session.
    pub handle: String,
    #[serde(flatten)]
    pub flow: FlowView<Listing>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub result: StepMove,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct RetreatResponse {
    pub moved: bool,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct FlowSummary {
    pub kind: FlowKind,
    pub steps: &'static [StepDefinition],
    pub fees: FeeSchedule,
}

#[derive(Debug, Serialize)]
pub struct DiscardResponse {
    pub discarded: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

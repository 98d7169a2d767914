//! Parameterized booking wizard.
//!
//! Every bookable service (doctor consultation, childcare, nurse visit,
//! emergency dispatch) runs the same flow: a step table, a fee schedule and
//! a service descriptor are the only things that differ.

pub mod draft;
pub mod payment;
pub mod steps;
pub mod ticket;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use draft::{BookingDraft, DraftUpdate, Field, VisitType};
pub use payment::{PaymentRequest, SimulatedGateway};
pub use steps::{StepController, StepDefinition, StepMove};
pub use ticket::{FeeSchedule, PaymentMethodDescriptor, Quote, Ticket, TicketIdGenerator};

/// The provider or listing a flow books.
pub trait ServiceDescriptor {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    fn base_fee(&self) -> i64;
}

// ── Step tables ──

static DOCTOR_STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "doctor_details",
        title: "Doctor Details",
        required: &[],
    },
    StepDefinition {
        id: "schedule",
        title: "Schedule",
        required: &[Field::Date, Field::Time],
    },
    StepDefinition {
        id: "consultation_info",
        title: "Consultation Info",
        required: &[Field::VisitType, Field::Reason],
    },
    StepDefinition {
        id: "payment",
        title: "Payment",
        required: &[],
    },
    StepDefinition {
        id: "confirmation",
        title: "Confirmation",
        required: &[],
    },
];

static CHILDCARE_STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "caregiver_details",
        title: "Caregiver Details",
        required: &[],
    },
    StepDefinition {
        id: "schedule",
        title: "Schedule",
        required: &[Field::Date, Field::Time],
    },
    StepDefinition {
        id: "care_details",
        title: "Care Details",
        required: &[Field::VisitType, Field::Reason],
    },
    StepDefinition {
        id: "payment",
        title: "Payment",
        required: &[],
    },
    StepDefinition {
        id: "confirmation",
        title: "Confirmation",
        required: &[],
    },
];

static NURSE_STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "nurse_details",
        title: "Nurse Details",
        required: &[],
    },
    StepDefinition {
        id: "schedule",
        title: "Schedule",
        required: &[Field::Date, Field::Time],
    },
    StepDefinition {
        id: "care_needs",
        title: "Care Needs",
        required: &[Field::Reason],
    },
    StepDefinition {
        id: "payment",
        title: "Payment",
        required: &[],
    },
    StepDefinition {
        id: "confirmation",
        title: "Confirmation",
        required: &[],
    },
];

// Emergency dispatch is immediate: no schedule step.
static EMERGENCY_STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "service_details",
        title: "Service Details",
        required: &[],
    },
    StepDefinition {
        id: "incident",
        title: "Incident Details",
        required: &[Field::Reason],
    },
    StepDefinition {
        id: "payment",
        title: "Payment",
        required: &[],
    },
    StepDefinition {
        id: "confirmation",
        title: "Confirmation",
        required: &[],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    DoctorConsultation,
    Childcare,
    NurseVisit,
    Emergency,
}

impl FlowKind {
    pub const ALL: [FlowKind; 4] = [
        FlowKind::DoctorConsultation,
        FlowKind::Childcare,
        FlowKind::NurseVisit,
        FlowKind::Emergency,
    ];

    pub fn steps(self) -> &'static [StepDefinition] {
        match self {
            FlowKind::DoctorConsultation => DOCTOR_STEPS,
            FlowKind::Childcare => CHILDCARE_STEPS,
            FlowKind::NurseVisit => NURSE_STEPS,
            FlowKind::Emergency => EMERGENCY_STEPS,
        }
    }

    pub fn fees(self) -> FeeSchedule {
        let platform_fee = match self {
            FlowKind::DoctorConsultation => 50,
            FlowKind::Childcare => 100,
            FlowKind::NurseVisit => 75,
            FlowKind::Emergency => 0,
        };
        FeeSchedule { platform_fee }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::DoctorConsultation => "doctor_consultation",
            FlowKind::Childcare => "childcare",
            FlowKind::NurseVisit => "nurse_visit",
            FlowKind::Emergency => "emergency",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

// ── Errors ──

/// Why a flow refused an operation. A blocked `advance` is not an error:
/// it is reported as [`StepMove::Blocked`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    PaymentInProgress,
    AlreadyConfirmed,
    NotAtPaymentStep,
    NoPaymentInFlight,
    MissingFields(Vec<Field>),
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::PaymentInProgress => write!(f, "Payment is already being processed"),
            FlowError::AlreadyConfirmed => write!(f, "Booking is already confirmed"),
            FlowError::NotAtPaymentStep => write!(f, "Payment is only possible on the payment step"),
            FlowError::NoPaymentInFlight => write!(f, "No payment is in progress"),
            FlowError::MissingFields(fields) => write!(f, "Missing required fields: {:?}", fields),
        }
    }
}

impl std::error::Error for FlowError {}

// ── Flow ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Idle,
    Processing,
    Confirmed,
}

/// One user's booking wizard.
#[derive(Debug, Clone)]
pub struct BookingFlow<S> {
    kind: FlowKind,
    steps: StepController,
    draft: BookingDraft<S>,
    fees: FeeSchedule,
    status: PaymentStatus,
    ticket: Option<Ticket>,
    attempts: u32,
    last_error: Option<String>,
}

/// Serializable snapshot of a flow, as rendered by the client.
#[derive(Debug, Clone, Serialize)]
pub struct FlowView<S> {
    pub kind: FlowKind,
    pub steps: &'static [StepDefinition],
    pub current_step: usize,
    pub current_step_id: &'static str,
    pub missing: Vec<Field>,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub status: PaymentStatus,
    pub processing: bool,
    pub confirmed: bool,
    pub draft: BookingDraft<S>,
    pub quote: Quote,
    pub ticket: Option<Ticket>,
    /// Payment attempts started so far.
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl<S: ServiceDescriptor> BookingFlow<S> {
    pub fn new(kind: FlowKind, service: S) -> Self {
        Self::with_config(kind, kind.steps(), kind.fees(), service)
    }

    /// Build a flow from an explicit step table and fee schedule.
    pub fn with_config(
        kind: FlowKind,
        steps: &'static [StepDefinition],
        fees: FeeSchedule,
        service: S,
    ) -> Self {
        Self {
            kind,
            steps: StepController::new(steps),
            draft: BookingDraft::new(service),
            fees,
            status: PaymentStatus::Idle,
            ticket: None,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn steps(&self) -> &StepController {
        &self.steps
    }

    pub fn draft(&self) -> &BookingDraft<S> {
        &self.draft
    }

    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    pub fn is_processing(&self) -> bool {
        self.status == PaymentStatus::Processing
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Draft edits and navigation are only allowed while no payment has started.
    pub fn ensure_editable(&self) -> Result<(), FlowError> {
        match self.status {
            PaymentStatus::Idle => Ok(()),
            PaymentStatus::Processing => Err(FlowError::PaymentInProgress),
            PaymentStatus::Confirmed => Err(FlowError::AlreadyConfirmed),
        }
    }

    pub fn update(&mut self, updates: Vec<DraftUpdate>) -> Result<(), FlowError> {
        self.ensure_editable()?;
        self.draft.apply_all(updates);
        Ok(())
    }

    pub fn advance(&mut self) -> Result<StepMove, FlowError> {
        if self.is_processing() {
            return Err(FlowError::PaymentInProgress);
        }
        Ok(self.steps.advance(&self.draft))
    }

    /// Step back. Returns `Ok(false)` on the first step.
    pub fn retreat(&mut self) -> Result<bool, FlowError> {
        self.ensure_editable()?;
        Ok(self.steps.retreat())
    }

    fn selected_method<'m>(
        &self,
        methods: &'m [PaymentMethodDescriptor],
    ) -> Option<&'m PaymentMethodDescriptor> {
        let id = self.draft.payment_method_id()?;
        methods.iter().find(|m| m.id == id)
    }

    /// Price for the current draft. An unknown method id is treated as no method.
    pub fn quote(&self, methods: &[PaymentMethodDescriptor]) -> Quote {
        Quote::new(
            self.draft.selected_service().base_fee(),
            self.fees.platform_fee,
            self.selected_method(methods),
        )
    }

    /// Start a payment attempt. Only one attempt can be in flight.
    pub fn begin_payment(
        &mut self,
        methods: &[PaymentMethodDescriptor],
        session_id: &str,
    ) -> Result<PaymentRequest, FlowError> {
        self.ensure_editable()?;
        if !self.steps.is_payment_step() {
            return Err(FlowError::NotAtPaymentStep);
        }
        let missing = self.steps.missing(&self.draft);
        if !missing.is_empty() {
            return Err(FlowError::MissingFields(missing));
        }

        self.attempts += 1;
        self.status = PaymentStatus::Processing;
        self.last_error = None;

        Ok(PaymentRequest {
            session_id: session_id.to_string(),
            attempt: self.attempts,
            idempotency_key: format!("{}-{}", session_id, self.attempts),
            amount: self.quote(methods).final_amount,
            method: self.selected_method(methods).cloned(),
        })
    }

    /// Finish a successful attempt: issue the ticket and enter the terminal step.
    pub fn complete_payment(
        &mut self,
        request: &PaymentRequest,
        ticket_id: String,
        now: DateTime<Utc>,
    ) -> Result<Ticket, FlowError> {
        if !self.is_processing() {
            return Err(FlowError::NoPaymentInFlight);
        }

        let ticket = ticket::generate_ticket(
            &self.draft,
            request.method.as_ref(),
            self.draft.selected_service().base_fee(),
            self.fees.platform_fee,
            ticket_id,
            now,
        );

        self.status = PaymentStatus::Confirmed;
        self.steps.enter_terminal();
        self.ticket = Some(ticket.clone());
        Ok(ticket)
    }

    pub fn fail_payment(&mut self, error: &payment::GatewayError) {
        if self.is_processing() {
            self.status = PaymentStatus::Idle;
            self.last_error = Some(error.to_string());
        }
    }

    pub fn view(&self, methods: &[PaymentMethodDescriptor]) -> FlowView<S>
    where
        S: Clone,
    {
        FlowView {
            kind: self.kind,
            steps: self.steps.steps(),
            current_step: self.steps.index(),
            current_step_id: self.steps.current().id,
            missing: self.steps.missing(&self.draft),
            can_advance: self.status == PaymentStatus::Idle && self.steps.can_advance(&self.draft),
            can_retreat: self.status == PaymentStatus::Idle && self.steps.can_retreat(),
            status: self.status,
            processing: self.is_processing(),
            confirmed: self.is_confirmed(),
            draft: self.draft.clone(),
            quote: self.quote(methods),
            ticket: self.ticket.clone(),
            attempts: self.attempts,
            last_error: self.last_error.clone(),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Doctor {
        fee: i64,
    }

    impl ServiceDescriptor for Doctor {
        fn id(&self) -> &str {
            "doc-1"
        }
        fn display_name(&self) -> &str {
            "Dr. Arjun Mehta"
        }
        fn base_fee(&self) -> i64 {
            self.fee
        }
    }

    const METHODS: &[PaymentMethodDescriptor] = &[
        PaymentMethodDescriptor {
            id: "card",
            name: "Card",
            description: "",
            discount_percent: None,
            available: true,
        },
        PaymentMethodDescriptor {
            id: "insurance",
            name: "Health Insurance",
            description: "",
            discount_percent: Some(80),
            available: true,
        },
    ];

    fn doctor_flow() -> BookingFlow<Doctor> {
        BookingFlow::new(FlowKind::DoctorConsultation, Doctor { fee: 2500 })
    }

    fn fill_schedule(flow: &mut BookingFlow<Doctor>) {
        flow.update(vec![
            DraftUpdate::Date(Some("2026-03-01".into())),
            DraftUpdate::Time(Some("10:00".into())),
        ])
        .unwrap();
    }

    fn to_payment(flow: &mut BookingFlow<Doctor>) {
        fill_schedule(flow);
        flow.update(vec![
            DraftUpdate::VisitType(Some(VisitType::Video)),
            DraftUpdate::Reason(Some("follow-up".into())),
        ])
        .unwrap();
        for _ in 0..3 {
            flow.advance().unwrap();
        }
        assert!(flow.steps().is_payment_step());
    }

    #[test]
    fn test_every_kind_ends_with_payment_then_confirmation() {
        for kind in FlowKind::ALL {
            let steps = kind.steps();
            assert_eq!(steps[steps.len() - 1].id, "confirmation");
            assert_eq!(steps[steps.len() - 2].id, "payment");
            assert_eq!(FlowKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FlowKind::parse("spa"), None);
    }

    #[test]
    fn test_schedule_blocks_with_date_only() {
        let mut flow = doctor_flow();
        flow.advance().unwrap();
        flow.update(vec![DraftUpdate::Date(Some("2026-03-01".into()))])
            .unwrap();

        let moved = flow.advance().unwrap();
        assert_eq!(
            moved,
            StepMove::Blocked {
                missing: vec![Field::Time]
            }
        );
        assert_eq!(flow.steps().current().id, "schedule");
    }

    #[test]
    fn test_retreat_then_advance_keeps_fields() {
        let mut flow = doctor_flow();
        flow.advance().unwrap();
        fill_schedule(&mut flow);
        flow.advance().unwrap();
        flow.update(vec![DraftUpdate::Reason(Some("rash".into()))])
            .unwrap();

        assert_eq!(flow.retreat(), Ok(true));
        assert_eq!(flow.steps().current().id, "schedule");
        assert_eq!(
            flow.advance().unwrap(),
            StepMove::Advanced {
                to: "consultation_info"
            }
        );
        assert_eq!(flow.draft().date(), Some("2026-03-01"));
        assert_eq!(flow.draft().time(), Some("10:00"));
        assert_eq!(flow.draft().reason(), Some("rash"));
    }

    #[test]
    fn test_quote_without_method_is_full_price() {
        let flow = doctor_flow();
        assert_eq!(flow.quote(METHODS).final_amount, 2550);
    }

    #[test]
    fn test_quote_with_discount() {
        let mut flow = doctor_flow();
        flow.update(vec![DraftUpdate::PaymentMethod(Some("insurance".into()))])
            .unwrap();
        assert_eq!(flow.quote(METHODS).final_amount, 510);
    }

    #[test]
    fn test_quote_unknown_method_counts_as_none() {
        let mut flow = doctor_flow();
        flow.update(vec![DraftUpdate::PaymentMethod(Some("bitcoin".into()))])
            .unwrap();
        assert_eq!(flow.quote(METHODS).final_amount, 2550);
    }

    #[test]
    fn test_begin_payment_requires_payment_step() {
        let mut flow = doctor_flow();
        assert_eq!(
            flow.begin_payment(METHODS, "s"),
            Err(FlowError::NotAtPaymentStep)
        );
        assert!(!flow.is_processing());
    }

    #[test]
    fn test_full_flow_to_confirmation() {
        let mut flow = doctor_flow();
        to_payment(&mut flow);
        assert_eq!(flow.advance().unwrap(), StepMove::AwaitingPayment);

        let request = flow.begin_payment(METHODS, "s").unwrap();
        assert_eq!(request.amount, 2550);
        assert!(request.method.is_none());
        assert!(flow.is_processing());

        // Everything is frozen while processing.
        assert_eq!(flow.advance(), Err(FlowError::PaymentInProgress));
        assert_eq!(flow.retreat(), Err(FlowError::PaymentInProgress));
        assert_eq!(
            flow.update(vec![DraftUpdate::Notes(Some("x".into()))]),
            Err(FlowError::PaymentInProgress)
        );

        let ticket = flow
            .complete_payment(&request, "TKT-1".into(), Utc::now())
            .unwrap();
        assert_eq!(ticket.final_amount, 2550);
        assert!(flow.is_confirmed());
        assert!(flow.steps().is_terminal());
        assert_eq!(flow.advance(), Ok(StepMove::AtTerminal));
        assert_eq!(flow.retreat(), Err(FlowError::AlreadyConfirmed));
        assert_eq!(
            flow.begin_payment(METHODS, "s"),
            Err(FlowError::AlreadyConfirmed)
        );
    }

    #[test]
    fn test_method_snapshot_is_used_for_ticket() {
        let mut flow = doctor_flow();
        to_payment(&mut flow);
        flow.update(vec![DraftUpdate::PaymentMethod(Some("insurance".into()))])
            .unwrap();
        let request = flow.begin_payment(METHODS, "s").unwrap();
        assert_eq!(request.amount, 510);

        let ticket = flow
            .complete_payment(&request, "TKT-2".into(), Utc::now())
            .unwrap();
        assert_eq!(ticket.discount_percent, 80);
        assert_eq!(ticket.final_amount, 510);
        assert_eq!(ticket.payment_method.as_deref(), Some("Health Insurance"));
    }

    #[test]
    fn test_complete_without_begin_is_rejected() {
        let mut flow = doctor_flow();
        let request = PaymentRequest {
            session_id: "s".into(),
            attempt: 1,
            idempotency_key: "s-1".into(),
            amount: 2550,
            method: None,
        };
        assert_eq!(
            flow.complete_payment(&request, "TKT".into(), Utc::now()),
            Err(FlowError::NoPaymentInFlight)
        );
        assert!(flow.ticket().is_none());
    }

    #[test]
    fn test_view_reflects_state() {
        let mut flow = doctor_flow();
        flow.advance().unwrap();
        flow.update(vec![DraftUpdate::Date(Some("2026-03-01".into()))])
            .unwrap();

        let view = flow.view(METHODS);
        assert_eq!(view.current_step, 1);
        assert_eq!(view.current_step_id, "schedule");
        assert_eq!(view.missing, vec![Field::Time]);
        assert!(!view.can_advance);
        assert!(view.can_retreat);
        assert!(!view.processing);
        assert_eq!(view.quote.final_amount, 2550);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["draft"]["date"], "2026-03-01");
        assert_eq!(json["missing"][0], "time");
    }

    #[test]
    fn test_emergency_flow_skips_schedule() {
        let mut flow = BookingFlow::new(FlowKind::Emergency, Doctor { fee: 1500 });
        flow.advance().unwrap();
        assert_eq!(
            flow.advance().unwrap(),
            StepMove::Blocked {
                missing: vec![Field::Reason]
            }
        );
        flow.update(vec![DraftUpdate::Reason(Some("chest pain".into()))])
            .unwrap();
        assert_eq!(flow.advance().unwrap(), StepMove::Advanced { to: "payment" });
        assert_eq!(flow.quote(METHODS).final_amount, 1500);
    }
}

//! Payment round trip for a booking flow.
//!
//! The simulated gateway waits a fixed delay and always succeeds. The
//! `PaymentGateway` seam keeps a failure branch so a real provider can be
//! plugged in without touching the flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

use super::ticket::{PaymentMethodDescriptor, Ticket, TicketIdGenerator};
use super::BookingFlow;

/// Default simulated gateway delay.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(3000);

/// One payment attempt, snapshotted when the attempt starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub session_id: String,
    pub attempt: u32,
    /// `<session>-<attempt>`; a real gateway would dedupe on this.
    pub idempotency_key: String,
    pub amount: i64,
    pub method: Option<PaymentMethodDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount: i64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError(pub String);

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payment gateway error: {}", self.0)
    }
}

impl std::error::Error for GatewayError {}

pub trait PaymentGateway: Send + Sync {
    fn charge(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentReceipt, GatewayError>> + Send;
}

/// Stand-in for a real gateway: sleeps, then succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

impl PaymentGateway for SimulatedGateway {
    fn charge(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentReceipt, GatewayError>> + Send {
        let delay = self.delay;
        let reference = format!("SIM-{}", request.idempotency_key);
        let amount = request.amount;
        async move {
            tokio::time::sleep(delay).await;
            Ok(PaymentReceipt {
                reference,
                amount,
                completed_at: Utc::now(),
            })
        }
    }
}

/// Await the gateway for a request previously returned by
/// [`BookingFlow::begin_payment`], then settle the flow.
///
/// The flow lock is not held while the gateway is pending, so the flow can
/// be read (and shows `processing`) in the meantime.
pub async fn settle_payment<G, S>(
    gateway: &G,
    flow: &Mutex<BookingFlow<S>>,
    request: PaymentRequest,
    ticket_ids: &TicketIdGenerator,
) -> Result<Ticket, GatewayError>
where
    G: PaymentGateway,
    S: super::ServiceDescriptor,
{
    tracing::info!(
        session = %request.session_id,
        attempt = request.attempt,
        amount = request.amount,
        "Payment processing started"
    );

    let outcome = gateway.charge(&request).await;
    let mut flow = flow.lock().await;

    match outcome {
        Ok(receipt) => {
            let now = Utc::now();
            let ticket_id = ticket_ids.next(now);
            let ticket = flow
                .complete_payment(&request, ticket_id, now)
                .map_err(|e| GatewayError(e.to_string()))?;
            tracing::info!(
                session = %request.session_id,
                reference = %receipt.reference,
                ticket = %ticket.ticket_id,
                "Payment confirmed"
            );
            Ok(ticket)
        }
        Err(e) => {
            tracing::warn!(session = %request.session_id, "Payment failed: {}", e);
            flow.fail_payment(&e);
            Err(e)
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::draft::DraftUpdate;
    use crate::booking::{FlowError, FlowKind, ServiceDescriptor};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Sitter;

    impl ServiceDescriptor for Sitter {
        fn id(&self) -> &str {
            "nanny-1"
        }
        fn display_name(&self) -> &str {
            "Priya Sharma"
        }
        // Childcare platform fee is 100, so the subtotal is 2550.
        fn base_fee(&self) -> i64 {
            2450
        }
    }

    struct DecliningGateway;

    impl PaymentGateway for DecliningGateway {
        fn charge(
            &self,
            _request: &PaymentRequest,
        ) -> impl Future<Output = Result<PaymentReceipt, GatewayError>> + Send {
            async { Err(GatewayError("card declined".into())) }
        }
    }

    const METHODS: &[PaymentMethodDescriptor] = &[PaymentMethodDescriptor {
        id: "insurance",
        name: "Health Insurance",
        description: "",
        discount_percent: Some(80),
        available: true,
    }];

    /// Walk a childcare flow up to its payment step.
    fn flow_at_payment() -> BookingFlow<Sitter> {
        let mut flow = BookingFlow::new(FlowKind::Childcare, Sitter);
        flow.update(vec![
            DraftUpdate::Date(Some("2026-03-01".into())),
            DraftUpdate::Time(Some("09:00".into())),
            DraftUpdate::VisitType(Some(crate::booking::VisitType::HomeVisit)),
            DraftUpdate::Reason(Some("after-school care".into())),
            DraftUpdate::PaymentMethod(Some("insurance".into())),
        ])
        .unwrap();
        while !flow.steps().is_payment_step() {
            flow.advance().unwrap();
        }
        flow
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_gateway_waits_then_succeeds() {
        let gateway = SimulatedGateway::default();
        let flow = Arc::new(Mutex::new(flow_at_payment()));
        let request = flow.lock().await.begin_payment(METHODS, "s1").unwrap();
        assert_eq!(request.amount, 510);
        assert_eq!(request.idempotency_key, "s1-1");

        let task = {
            let flow = flow.clone();
            tokio::spawn(async move {
                let ids = TicketIdGenerator::new();
                settle_payment(&gateway, &*flow, request, &ids).await
            })
        };

        tokio::time::sleep(Duration::from_millis(2999)).await;
        {
            let f = flow.lock().await;
            assert!(f.is_processing());
            assert!(!f.is_confirmed());
        }

        let ticket = task.await.unwrap().unwrap();
        assert_eq!(ticket.final_amount, 510);

        let f = flow.lock().await;
        assert!(!f.is_processing());
        assert!(f.is_confirmed());
        assert!(f.steps().is_terminal());
        assert_eq!(f.ticket().map(|t| t.ticket_id.as_str()), Some(ticket.ticket_id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_trigger_while_processing_is_rejected() {
        let flow = Mutex::new(flow_at_payment());
        let first = flow.lock().await.begin_payment(METHODS, "s1");
        assert!(first.is_ok());

        let second = flow.lock().await.begin_payment(METHODS, "s1");
        assert_eq!(second, Err(FlowError::PaymentInProgress));
        assert_eq!(flow.lock().await.attempts(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_returns_to_payment_step() {
        let flow = Mutex::new(flow_at_payment());
        let request = flow.lock().await.begin_payment(METHODS, "s1").unwrap();

        let ids = TicketIdGenerator::new();
        let result = settle_payment(&DecliningGateway, &flow, request, &ids).await;
        assert_eq!(result.unwrap_err(), GatewayError("card declined".into()));

        let mut f = flow.lock().await;
        assert!(!f.is_processing());
        assert!(!f.is_confirmed());
        assert!(f.steps().is_payment_step());
        assert_eq!(f.last_error(), Some("Payment gateway error: card declined"));

        // A retry is a new attempt with a new idempotency key.
        let retry = f.begin_payment(METHODS, "s1").unwrap();
        assert_eq!(retry.idempotency_key, "s1-2");
    }
}

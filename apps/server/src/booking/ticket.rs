use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

use super::draft::{BookingDraft, VisitType};
use super::ServiceDescriptor;

/// Static payment option shown on the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Percentage in [0, 100] taken off the whole amount (service + platform fee).
    pub discount_percent: Option<u8>,
    pub available: bool,
}

/// Fees added on top of the selected service's own fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    pub platform_fee: i64,
}

/// Price breakdown for the current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub base_fee: i64,
    pub platform_fee: i64,
    pub discount_percent: u8,
    pub final_amount: i64,
}

impl Quote {
    pub fn new(base_fee: i64, platform_fee: i64, method: Option<&PaymentMethodDescriptor>) -> Self {
        let discount_percent = method
            .and_then(|m| m.discount_percent)
            .map(|d| d.min(100))
            .unwrap_or(0);
        Self {
            base_fee,
            platform_fee,
            discount_percent,
            final_amount: final_amount(base_fee, platform_fee, Some(discount_percent)),
        }
    }
}

/// `round((base + platform) * (1 - discount / 100))`; no discount when absent.
pub fn final_amount(base_fee: i64, platform_fee: i64, discount_percent: Option<u8>) -> i64 {
    let subtotal = base_fee + platform_fee;
    match discount_percent {
        None | Some(0) => subtotal,
        Some(d) => {
            let d = f64::from(d.min(100));
            (subtotal as f64 * (1.0 - d / 100.0)).round() as i64
        }
    }
}

/// Display record produced when a payment completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub service_id: String,
    pub service_name: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub visit_type: Option<VisitType>,
    pub payment_method: Option<String>,
    pub base_fee: i64,
    pub platform_fee: i64,
    pub discount_percent: u8,
    pub final_amount: i64,
    pub issued_at: DateTime<Utc>,
}

/// Build the ticket for a draft. Pure: the id and timestamp are passed in.
pub fn generate_ticket<S: ServiceDescriptor>(
    draft: &BookingDraft<S>,
    method: Option<&PaymentMethodDescriptor>,
    base_fee: i64,
    platform_fee: i64,
    ticket_id: String,
    issued_at: DateTime<Utc>,
) -> Ticket {
    let quote = Quote::new(base_fee, platform_fee, method);
    let service = draft.selected_service();

    Ticket {
        ticket_id,
        service_id: service.id().to_string(),
        service_name: service.display_name().to_string(),
        date: draft.date().map(str::to_string),
        time: draft.time().map(str::to_string),
        visit_type: draft.visit_type(),
        payment_method: method.map(|m| m.name.to_string()),
        base_fee,
        platform_fee,
        discount_percent: quote.discount_percent,
        final_amount: quote.final_amount,
        issued_at,
    }
}

/// Timestamp-based ticket ids: `TKT-<unix millis>`.
///
/// Ids issued within the same millisecond get a `-<n>` suffix. Nothing
/// coordinates across processes, so ids are for display only.
#[derive(Debug, Default)]
pub struct TicketIdGenerator {
    last: Mutex<(i64, u32)>,
}

impl TicketIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if last.0 == millis {
            last.1 += 1;
            format!("TKT-{}-{}", millis, last.1)
        } else {
            *last = (millis, 0);
            format!("TKT-{}", millis)
        }
    }
}

// ── Tests ──

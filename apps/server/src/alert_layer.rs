//! Tracing layer that forwards ERROR events to an alert webhook.
//!
//! - At most one alert per `MIN_INTERVAL` (10 s)
//! - Identical messages are suppressed for `DEDUP_WINDOW` (60 s)
//! - HTTP calls are spawned onto the Tokio runtime, never awaited inline

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

const MIN_INTERVAL: Duration = Duration::from_secs(10);
const DEDUP_WINDOW: Duration = Duration::from_secs(60);

// ── Throttle ──

/// Rate limit + dedup state for outgoing alerts.
#[derive(Debug)]
struct AlertThrottle {
    last_sent: Option<Instant>,
    /// (hash, sent_at) of recently sent messages.
    recent: Vec<(u64, Instant)>,
}

impl AlertThrottle {
    fn new() -> Self {
        Self {
            last_sent: None,
            recent: Vec::new(),
        }
    }

    /// Record and allow the alert, or refuse it.
    fn should_send(&mut self, hash: u64, now: Instant) -> bool {
        self.recent
            .retain(|(_, ts)| now.duration_since(*ts) < DEDUP_WINDOW);

        let is_dup = self.recent.iter().any(|(h, _)| *h == hash);
        let too_soon = self
            .last_sent
            .is_some_and(|last| now.duration_since(last) < MIN_INTERVAL);

        if is_dup || too_soon {
            return false;
        }
        self.last_sent = Some(now);
        self.recent.push((hash, now));
        true
    }
}

fn message_hash(message: &str) -> u64 {
    let mut h = DefaultHasher::new();
    message.hash(&mut h);
    h.finish()
}

// ── Layer ──

pub struct AlertLayer {
    webhook_url: String,
    http: reqwest::Client,
    throttle: Mutex<AlertThrottle>,
}

impl AlertLayer {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
            throttle: Mutex::new(AlertThrottle::new()),
        }
    }
}

impl<S: Subscriber> Layer<S> for AlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.message();

        let should_send = match self.throttle.lock() {
            Ok(mut throttle) => throttle.should_send(message_hash(&message), Instant::now()),
            Err(_) => false,
        };
        if !should_send {
            return;
        }

        // Logging can happen outside the runtime (startup, shutdown).
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let meta = event.metadata();
        let location = format!(
            "{}:{}",
            meta.file().unwrap_or("?"),
            meta.line().map(|l| l.to_string()).unwrap_or_else(|| "?".into())
        );
        let body = serde_json::json!({
            "text": format!("careflow error: {}", message),
            "level": "error",
            "target": meta.target(),
            "location": location,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let client = self.http.clone();
        let url = self.webhook_url.clone();
        runtime.spawn(async move {
            let _ = client.post(&url).json(&body).send().await;
        });
    }
}

// ── Field visitor ──

/// Collects the `message` field plus any structured fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl MessageVisitor {
    fn message(&self) -> String {
        if self.fields.is_empty() {
            return self.message.clone();
        }
        let extras: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if self.message.is_empty() {
            extras.join(", ")
        } else {
            format!("{} ({})", self.message, extras.join(", "))
        }
    }

    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }
}

// ── Tests ──

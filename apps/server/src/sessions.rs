use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::booking::BookingFlow;
use crate::catalog::Listing;

pub type SharedFlow = Arc<Mutex<BookingFlow<Listing>>>;

/// Default idle time after which an abandoned draft is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    flow: SharedFlow,
    last_seen: Instant,
}

/// In-memory booking sessions keyed by session id.
///
/// Nothing here is persisted: a restart drops every draft.
#[derive(Default)]
pub struct SessionStore {
    entries: DashMap<String, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: String, flow: BookingFlow<Listing>) -> SharedFlow {
        let flow = Arc::new(Mutex::new(flow));
        self.entries.insert(
            id,
            SessionEntry {
                flow: flow.clone(),
                last_seen: Instant::now(),
            },
        );
        flow
    }

    /// Look up a session and mark it as recently used.
    pub fn get(&self, id: &str) -> Option<SharedFlow> {
        let mut entry = self.entries.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.flow.clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop sessions idle for at least `ttl`. Sessions with a payment in
    /// flight (or currently locked by a request) are kept.
    /// Returns the number of sessions removed.
    pub fn cleanup(&self, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            if entry.last_seen.elapsed() < ttl {
                return true;
            }
            match entry.flow.try_lock() {
                Ok(flow) => flow.is_processing(),
                Err(_) => true,
            }
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!("Expired {} idle booking sessions", removed);
        }
        removed
    }
}

// ── Tests ──

//! Signed session handles.
//!
//! A handle is `<id>.<sig>` where `sig = hex(HMAC-SHA256(secret, id))`.
//! Booking sessions live only in memory, so the signature is all that keeps
//! one client from addressing another client's draft.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::atomic::{AtomicU64, Ordering};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug)]
pub struct SessionSigner {
    secret: Vec<u8>,
    counter: AtomicU64,
}

impl SessionSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    fn sign(&self, id: &str) -> String {
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Issue a fresh `(id, handle)` pair. Ids are unique per process.
    pub fn issue(&self) -> (String, String) {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = format!("{:x}{:06x}", chrono::Utc::now().timestamp_millis(), seq);
        let handle = format!("{}.{}", id, self.sign(&id));
        (id, handle)
    }

    /// Check a handle and return its session id.
    pub fn verify<'h>(&self, handle: &'h str) -> Option<&'h str> {
        let (id, sig) = handle.split_once('.')?;
        if id.is_empty() {
            return None;
        }
        let sig = hex::decode(sig).ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        match mac.verify_slice(&sig) {
            Ok(()) => Some(id),
            Err(_) => {
                tracing::warn!("session handle signature mismatch");
                None
            }
        }
    }
}

// ── Tests ──

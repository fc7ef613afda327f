//! # Rate Gate Module
//!
//! Per-caller fixed-window request counter.
//!
//! ## Algorithm
//!
//! On every [`RateGate::check`]:
//!
//! 1. Drop every tracked caller whose window has ended (all callers, not just
//!    the current one, so memory stays bounded under many distinct callers).
//! 2. Look up the caller, or start a fresh window `{count: 0, reset_at: now + window}`.
//! 3. If `count >= max` and the window is still open, reject with the
//!    remaining whole seconds.
//! 4. If the window has ended, restart it.
//! 5. Count the request.
//!
//! ## Boundary Bursts
//!
//! This is a fixed window, not a sliding window or token bucket. A caller
//! can get `max` requests at the very end of one window and `max` more at
//! the start of the next, so up to `2 * max` requests may be admitted
//! across a boundary.
//!
//! ## Caller Identity
//!
//! The gate only sees an opaque identity string. [`caller_identity`] derives
//! one from forwarded-IP headers; with no request context the identity is
//! [`GLOBAL_CALLER`].

use crate::error::RateLimitExceeded;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Identity used when no caller context is supplied.
pub const GLOBAL_CALLER: &str = "global";

/// Identity used when a request carries none of the forwarded-IP headers.
pub const UNKNOWN_CALLER: &str = "unknown";

/// Window size and quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateGateConfig {
    /// Requests admitted per caller per window.
    pub max: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RateGateConfig {
    pub fn new(max: u32, window_ms: u64) -> Self {
        Self { max, window_ms }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateGateConfig {
    fn default() -> Self {
        Self {
            max: 15,
            window_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window rate limiter keyed by caller identity.
///
/// Clones share state.
#[derive(Clone)]
pub struct RateGate {
    config: RateGateConfig,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

impl RateGate {
    pub fn new(config: RateGateConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> RateGateConfig {
        self.config
    }

    /// Admit or reject one request for `caller` (`None` means [`GLOBAL_CALLER`]).
    pub fn check(&self, caller: Option<&str>) -> Result<(), RateLimitExceeded> {
        let caller = caller.unwrap_or(GLOBAL_CALLER);
        let now = Instant::now();
        let window = self.config.window();

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        entries.retain(|_, entry| now <= entry.reset_at);

        let mut entry = entries.get(caller).copied().unwrap_or(WindowEntry {
            count: 0,
            reset_at: now + window,
        });

        if entry.count >= self.config.max && now < entry.reset_at {
            let remaining = entry.reset_at - now;
            let retry_after_secs = remaining.as_nanos().div_ceil(1_000_000_000) as u64;
            warn!(caller, retry_after_secs, "Rate gate rejected request");
            return Err(RateLimitExceeded { retry_after_secs });
        }

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        entry.count += 1;
        debug!(caller, count = entry.count, max = self.config.max, "Rate gate admitted request");
        entries.insert(caller.to_string(), entry);
        Ok(())
    }

    /// Requests left in `caller`'s current window.
    pub fn remaining(&self, caller: Option<&str>) -> u32 {
        let caller = caller.unwrap_or(GLOBAL_CALLER);
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(caller) {
            Some(entry) if now < entry.reset_at => self.config.max.saturating_sub(entry.count),
            _ => self.config.max,
        }
    }

    /// Number of callers currently tracked (including ones not yet purged).
    pub fn tracked_callers(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Derive a caller identity from request headers.
///
/// First address of `x-forwarded-for`, else `x-real-ip`, else
/// `cf-connecting-ip`, else [`UNKNOWN_CALLER`].
pub fn caller_identity(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .or_else(|| header("cf-connecting-ip"))
        .unwrap_or(UNKNOWN_CALLER)
        .to_string()
}

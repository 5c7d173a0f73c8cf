//! Sliding-Window Rate Limiter
//!
//! Admission gate bounding outbound LLM calls to `max_requests` per rolling
//! window. One limiter is shared by every caller and every artifact type;
//! it never blocks. A refused caller gets [`SrsError::RateLimited`] carrying
//! the number of whole seconds until the oldest recorded call leaves the
//! window, and decides for itself when to come back.
//!
//! ## State
//!
//! ```text
//! VecDeque<Instant>  oldest ──────────────► newest
//!                    [t0, t1, ..., tn]      (n < max_requests)
//! ```
//!
//! Timestamps are pruned lazily on each [`RateLimiter::try_acquire`] call.
//! The whole prune/check/record sequence runs under one mutex so two
//! concurrent callers can never both take the last slot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::types::{Result, SrsError};

// =============================================================================
// Clock
// =============================================================================

/// Time source for the limiter
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.origin + *offset
    }
}

// =============================================================================
// Rate Limiter
// =============================================================================

/// Shared handle injected into providers
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Rolling-window admission gate
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter backed by the system clock
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    /// Create a limiter with an explicit time source
    pub fn with_clock(max_requests: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Build from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    /// Convenience constructor for a shared handle
    pub fn shared(self) -> SharedRateLimiter {
        Arc::new(self)
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Try to admit one request
    ///
    /// Records the current instant on success. On refusal nothing is
    /// recorded and the error carries the wait estimate in whole seconds,
    /// rounded up.
    pub fn try_acquire(&self) -> Result<()> {
        let now = self.clock.now();
        let mut timestamps = self.lock();

        Self::prune(&mut timestamps, now, self.window);

        if timestamps.len() >= self.max_requests {
            let wait = match timestamps.front() {
                Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                None => self.window,
            };
            let wait_secs = ceil_secs(wait);
            warn!(
                in_window = timestamps.len(),
                max_requests = self.max_requests,
                wait_secs,
                "Rate limit reached"
            );
            return Err(SrsError::RateLimited { wait_secs });
        }

        timestamps.push_back(now);
        debug!(
            in_window = timestamps.len(),
            max_requests = self.max_requests,
            "Request admitted"
        );
        Ok(())
    }

    /// Number of recorded requests still inside the window
    pub fn in_window(&self) -> usize {
        let now = self.clock.now();
        let mut timestamps = self.lock();
        Self::prune(&mut timestamps, now, self.window);
        timestamps.len()
    }

    /// Remaining admissions before the gate closes
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.in_window())
    }

    fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Instant>> {
        self.timestamps.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Rate limiter window Mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Whole seconds, rounded up
fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

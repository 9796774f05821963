//! Billing timer: pause/resume stopwatch for chargeable execution time
//!
//! The timer is Running while `billed_time` is zero and Paused otherwise.
//! Pausing freezes the elapsed span in `billed_time`; resuming moves
//! `pseudo_start` back by that span so later readings continue from the
//! frozen value. Pausing twice, or resuming twice, is a no-op.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone)]
pub struct BillingTimer {
    clock: Arc<dyn Clock>,
    pseudo_start: Instant,
    billed_time: Duration,
}

impl BillingTimer {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let pseudo_start = clock.now();
        BillingTimer {
            clock,
            pseudo_start,
            billed_time: Duration::ZERO,
        }
    }

    /// Start measuring from now, in the Running state
    pub fn start(&mut self) {
        self.pseudo_start = self.clock.now();
        self.billed_time = Duration::ZERO;
    }

    pub fn pause(&mut self) {
        if self.is_paused() {
            return;
        }
        self.billed_time = self
            .clock
            .now()
            .saturating_duration_since(self.pseudo_start);
    }

    pub fn resume(&mut self) {
        if !self.is_paused() {
            return;
        }
        let now = self.clock.now();
        self.pseudo_start = now.checked_sub(self.billed_time).unwrap_or(now);
        self.billed_time = Duration::ZERO;
    }

    pub fn is_paused(&self) -> bool {
        self.billed_time > Duration::ZERO
    }

    /// Chargeable time so far. While paused this is the frozen span.
    pub fn elapsed(&self) -> Duration {
        if self.is_paused() {
            self.billed_time
        } else {
            self.clock
                .now()
                .saturating_duration_since(self.pseudo_start)
        }
    }
}

impl Default for BillingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BillingTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingTimer")
            .field("pseudo_start", &self.pseudo_start)
            .field("billed_time", &self.billed_time)
            .finish()
    }
}

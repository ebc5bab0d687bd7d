//! Request gate for the quote provider.
//!
//! Alpha Vantage answers quota exhaustion with a "Note" body rather than an HTTP
//! error. Repeated quota notices or network failures open the breaker, after which
//! every request is refused until the cooldown has elapsed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Closed { failures: u32 },
    Open { since: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    gate: Mutex<Gate>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            gate: Mutex::new(Gate::Closed { failures: 0 }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 30-minute cooldown, opens after 3 consecutive failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60), 3)
    }

    fn lock(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a request may be sent now. An expired cooldown closes the breaker.
    pub fn is_allowed(&self) -> bool {
        let mut gate = self.lock();
        match *gate {
            Gate::Closed { .. } => true,
            Gate::Open { since } if since.elapsed() >= self.cooldown => {
                *gate = Gate::Closed { failures: 0 };
                true
            }
            Gate::Open { .. } => false,
        }
    }

    pub fn record_success(&self) {
        *self.lock() = Gate::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut gate = self.lock();
        if let Gate::Closed { failures } = *gate {
            let failures = failures + 1;
            *gate = if failures >= self.failure_threshold {
                tracing::warn!(failures, "circuit breaker opened");
                Gate::Open {
                    since: Instant::now(),
                }
            } else {
                Gate::Closed { failures }
            };
        }
    }

    /// Open immediately, e.g. on a rejected API key.
    pub fn trip(&self) {
        *self.lock() = Gate::Open {
            since: Instant::now(),
        };
    }

    pub fn remaining_cooldown(&self) -> Duration {
        match *self.lock() {
            Gate::Closed { .. } => Duration::ZERO,
            Gate::Open { since } => self.cooldown.saturating_sub(since.elapsed()),
        }
    }
}

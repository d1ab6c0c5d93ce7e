//! Per-service circuit breaker.
//!
//! Each guard service owns exactly one breaker. State lives behind its own
//! mutex, so breakers for different services never contend with each other.
//!
//! ```text
//! CLOSED --(threshold consecutive failures)--> OPEN
//! OPEN   --(cooldown elapsed, next admission)--> HALF_OPEN (one trial call)
//! HALF_OPEN --(trial abandoned)--> HALF_OPEN (slot free again)
//! HALF_OPEN --(success)--> CLOSED
//! HALF_OPEN --(failure)--> OPEN (cooldown restarts)
//! ```

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use gate_models::{CircuitSnapshot, CircuitState, ServiceId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::metrics;

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    trial_in_flight: bool,
    total_failures: u64,
    times_opened: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    service: ServiceId,
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker. A threshold of zero is treated as one.
    pub fn new(service: ServiceId, threshold: u32, cooldown: Duration) -> Self {
        Self {
            service,
            threshold: threshold.max(1),
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                last_failure_at: None,
                trial_in_flight: false,
                total_failures: 0,
                times_opened: 0,
            }),
        }
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    /// Decide whether a call may proceed.
    ///
    /// An OPEN breaker whose cooldown has elapsed moves to HALF_OPEN here and
    /// hands the single trial slot to this caller. Callers that can be
    /// cancelled mid-call should use [`CircuitBreaker::acquire`] instead.
    pub fn can_execute(&self) -> bool {
        self.admit().is_some()
    }

    /// Admit a call and return a permit tied to its outcome.
    ///
    /// A permit dropped without [`CallPermit::record_success`] or
    /// [`CallPermit::record_failure`] gives its HALF_OPEN trial slot back.
    pub fn acquire(&self) -> Option<CallPermit<'_>> {
        self.admit().map(|trial| CallPermit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    /// Returns `Some(true)` when the admitted call holds the trial slot.
    fn admit(&self) -> Option<bool> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if !cooled {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                info!(service = %self.service, "Circuit breaker half-open, allowing trial call");
                metrics::set_circuit_state(self.service, CircuitState::HalfOpen);
                Some(true)
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    None
                } else {
                    inner.trial_in_flight = true;
                    Some(true)
                }
            }
        }
    }

    /// Record a successful call. Closes the breaker.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state;
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;

        if previous != CircuitState::Closed {
            info!(service = %self.service, from = %previous, "Circuit breaker closed");
            metrics::set_circuit_state(self.service, CircuitState::Closed);
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.total_failures += 1;
        inner.last_failure_at = Some(Utc::now());
        inner.trial_in_flight = false;

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.threshold,
            CircuitState::Open => false,
        };

        if should_open {
            let from = inner.state;
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.times_opened += 1;
            warn!(
                service = %self.service,
                from = %from,
                consecutive_failures = inner.consecutive_failures,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit breaker opened"
            );
            metrics::set_circuit_state(self.service, CircuitState::Open);
        } else if inner.state == CircuitState::Open {
            // A call admitted before the breaker opened finished late; extend the cooldown
            inner.opened_at = Some(Instant::now());
        }
    }

    /// Give back a HALF_OPEN trial slot without recording an outcome.
    ///
    /// Runs when the admitted call failed locally before any I/O, or when a
    /// trial [`CallPermit`] is dropped without an outcome.
    pub fn release_trial(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen && inner.trial_in_flight {
            inner.trial_in_flight = false;
            debug!(service = %self.service, "Released half-open trial slot");
        }
    }

    /// Current state without triggering any transition.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        CircuitSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
            cooldown_ms: self.cooldown.as_millis() as u64,
            total_failures: inner.total_failures,
            times_opened: inner.times_opened,
        }
    }
}

/// Admission to call a guarded service.
///
/// Holds the HALF_OPEN trial slot when the breaker was probing for recovery.
#[must_use = "dropping the permit without an outcome releases it"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl CallPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            self.breaker.release_trial();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn breaker(threshold: u32, cooldown_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            ServiceId::TrustGuard,
            threshold,
            Duration::from_millis(cooldown_ms),
        )
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(3, 60_000);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_execute());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.can_execute());
        assert_eq!(cb.snapshot().times_opened, 1);
    }

    #[test]
    fn test_success_resets_consecutive_count() {
        let cb = breaker(2, 60_000);
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        let snap = cb.snapshot();
        assert_eq!(snap.consecutive_failures, 1);
        assert_eq!(snap.total_failures, 2);
    }

    #[test]
    fn test_half_open_admits_single_trial() {
        let cb = breaker(1, 0);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        assert!(cb.can_execute());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(!cb.can_execute());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_execute());
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(1, 0);
        cb.record_failure();
        assert!(cb.can_execute());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.snapshot().times_opened, 2);
    }

    #[test]
    fn test_release_trial_frees_slot() {
        let cb = breaker(1, 0);
        cb.record_failure();
        assert!(cb.can_execute());
        assert!(!cb.can_execute());
        cb.release_trial();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.can_execute());
    }

    #[test]
    fn test_dropped_trial_permit_frees_slot() {
        let cb = breaker(1, 0);
        cb.record_failure();

        let permit = cb.acquire().unwrap();
        assert!(permit.is_trial());
        assert!(cb.acquire().is_none());
        drop(permit);

        assert_eq!(cb.state(), CircuitState::HalfOpen);
        let permit = cb.acquire().unwrap();
        permit.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_settled_permit_keeps_outcome() {
        let cb = breaker(1, 0);
        cb.record_failure();
        let permit = cb.acquire().unwrap();
        permit.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.snapshot().times_opened, 2);

        let closed = breaker(3, 60_000);
        let permit = closed.acquire().unwrap();
        assert!(!permit.is_trial());
        drop(permit);
        assert_eq!(closed.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn test_open_rejects_until_cooldown() {
        let cb = breaker(1, 50);
        cb.record_failure();
        assert!(!cb.can_execute());
        std::thread::sleep(Duration::from_millis(60));
        assert!(cb.can_execute());
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        let cb = breaker(0, 60_000);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_concurrent_failures_open_exactly_once() {
        let cb = Arc::new(breaker(5, 60_000));
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let cb = Arc::clone(&cb);
                std::thread::spawn(move || cb.record_failure())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snap = cb.snapshot();
        assert_eq!(snap.state, CircuitState::Open);
        assert_eq!(snap.total_failures, 5);
        assert_eq!(snap.times_opened, 1);
    }
}

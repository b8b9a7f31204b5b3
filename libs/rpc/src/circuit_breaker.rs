//! Per-endpoint circuit breaker. One instance guards one stable endpoint
//! key; state transitions: closed -> open after `failure_threshold`
//! consecutive failures, open -> half-open after `recovery_timeout`
//! elapses, half-open -> closed on the next success or back to open on
//! the next failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use yieldkeeper_types::CircuitState;

struct Inner {
    state: CircuitState,
    failures: u32,
    opened_at: Option<Instant>,
}

/// Thread-safe circuit breaker. Cloning shares state (`Arc` inside).
#[derive(Clone)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Arc<RwLock<Inner>>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            inner: Arc::new(RwLock::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                opened_at: None,
            })),
        }
    }

    /// Reading `is_open` is itself a transition point: OPEN moves to
    /// HALF_OPEN once `recovery_timeout` has elapsed since it opened.
    pub fn is_open(&self) -> bool {
        let mut inner = self.inner.write();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                    tracing::info!("circuit breaker entering half-open state");
                    false
                } else {
                    true
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.read().state
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.write();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.failures = 0;
                tracing::info!("circuit breaker closed after successful recovery");
            }
            CircuitState::Closed => {
                inner.failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.write();
        inner.failures += 1;

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                tracing::warn!("circuit breaker re-opened after recovery failure");
            }
            CircuitState::Closed => {
                if inner.failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    tracing::warn!(failures = inner.failures, "circuit breaker opened");
                }
            }
            CircuitState::Open => {}
        }
    }
}

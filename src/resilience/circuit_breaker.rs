//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: service assumed down, requests fail fast
//! - Half-Open: one probe request is in flight
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Half-Open: request arrives after the cooldown (that request is the probe)
//! Half-Open → Closed: probe succeeds
//! Half-Open → Open: probe fails, or is abandoned before reaching the service
//! ```
//!
//! # Design Decisions
//! - One breaker per known service name, not per instance
//! - Admission is decided under a mutex, so only one request wins the probe
//! - Arrivals while the probe is in flight are rejected as if Open
//! - A `BreakerPermit` that is dropped unsettled hands the probe back

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::routing::KnownService;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Mutable record behind one breaker.
#[derive(Debug, Clone)]
struct BreakerRecord {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

/// Breaker for a single service.
#[derive(Debug)]
pub struct CircuitBreaker {
    service: KnownService,
    config: BreakerConfig,
    record: Mutex<BreakerRecord>,
}

impl CircuitBreaker {
    pub fn new(service: KnownService, config: BreakerConfig) -> Self {
        Self {
            service,
            config,
            record: Mutex::new(BreakerRecord {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
            }),
        }
    }

    pub fn service(&self) -> KnownService {
        self.service
    }

    /// Ask to send a request downstream.
    pub fn try_acquire(self: &Arc<Self>) -> Option<BreakerPermit> {
        self.try_acquire_at(Instant::now())
    }

    /// Admission decision at the given instant. `None` means short-circuit.
    pub fn try_acquire_at(self: &Arc<Self>, now: Instant) -> Option<BreakerPermit> {
        let mut record = self.lock();
        let probe = match record.state {
            CircuitState::Closed => false,
            CircuitState::HalfOpen => return None,
            CircuitState::Open => {
                let cooled_down = record
                    .last_failure
                    .map_or(true, |at| now.saturating_duration_since(at) > self.config.cooldown());
                if !cooled_down {
                    return None;
                }
                record.state = CircuitState::HalfOpen;
                tracing::info!(service = %self.service, "Circuit half-open, admitting probe request");
                true
            }
        };

        Some(BreakerPermit {
            breaker: Arc::clone(self),
            probe,
            settled: false,
        })
    }

    /// Any success closes the circuit and clears the failure count.
    pub fn record_success(&self) {
        let mut record = self.lock();
        let previous = record.state;
        record.consecutive_failures = 0;
        record.state = CircuitState::Closed;
        if previous != CircuitState::Closed {
            tracing::info!(service = %self.service, "Circuit closed");
            metrics::record_breaker_state(self.service.as_str(), false);
        }
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    /// Count a failure. Opens the circuit at the threshold, and re-opens it
    /// when the failure was the half-open probe.
    pub fn record_failure_at(&self, now: Instant) {
        let mut record = self.lock();
        record.consecutive_failures = record.consecutive_failures.saturating_add(1);
        record.last_failure = Some(now);

        let trips = record.state == CircuitState::HalfOpen
            || record.consecutive_failures >= self.config.failure_threshold;
        if trips && record.state != CircuitState::Open {
            record.state = CircuitState::Open;
            tracing::error!(
                service = %self.service,
                failures = record.consecutive_failures,
                "Circuit breaker open"
            );
            metrics::record_breaker_state(self.service.as_str(), true);
        }
    }

    /// Return an unused probe slot: Half-Open goes back to Open with the
    /// last failure time it already had, so the next arrival may probe immediately.
    fn abandon_probe(&self) {
        let mut record = self.lock();
        if record.state == CircuitState::HalfOpen {
            record.state = CircuitState::Open;
            tracing::debug!(service = %self.service, "Probe abandoned, circuit back to open");
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let record = self.lock();
        BreakerSnapshot {
            state: record.state,
            consecutive_failures: record.consecutive_failures,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Admission ticket for one downstream call.
///
/// Settle it with [`succeed`](Self::succeed) or [`fail`](Self::fail). Dropping
/// it unsettled (no instance found, client went away, timeout) records
/// nothing, except that a held probe slot is released.
#[derive(Debug)]
pub struct BreakerPermit {
    breaker: Arc<CircuitBreaker>,
    probe: bool,
    settled: bool,
}

impl BreakerPermit {
    /// Whether this request is the half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for BreakerPermit {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.abandon_probe();
        }
    }
}

/// One breaker per known service, created up front.
#[derive(Debug)]
pub struct BreakerBank {
    breakers: HashMap<KnownService, Arc<CircuitBreaker>>,
}

impl BreakerBank {
    pub fn new(config: BreakerConfig) -> Self {
        let breakers = KnownService::ALL
            .into_iter()
            .map(|svc| (svc, Arc::new(CircuitBreaker::new(svc, config))))
            .collect();
        Self { breakers }
    }

    pub fn get(&self, service: KnownService) -> Option<&Arc<CircuitBreaker>> {
        self.breakers.get(&service)
    }

    /// State of every breaker, ordered by service.
    pub fn snapshot(&self) -> Vec<(KnownService, BreakerSnapshot)> {
        let mut all: Vec<_> = self
            .breakers
            .iter()
            .map(|(svc, breaker)| (*svc, breaker.snapshot()))
            .collect();
        all.sort_by_key(|(svc, _)| *svc);
        all
    }
}

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request for a known service:
//!     → circuit_breaker.rs (admit, short-circuit, or admit as half-open probe)
//!     → downstream call
//!     → permit settled: success closes, failure counts toward opening
//! ```
//!
//! # Design Decisions
//! - No retries inside the gateway; the half-open probe is the only re-attempt
//! - Breaker state lives in memory only and is never touched by persistence errors
//! - The only timeout the core needs is the liveness probe's (see health::probe)

pub mod circuit_breaker;

pub use circuit_breaker::{BreakerBank, BreakerPermit, BreakerSnapshot, CircuitBreaker, CircuitState};

//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Health sweep (sweep.rs):
//!     Periodic timer
//!     → snapshot registry instances
//!     → probe.rs for each (concurrently, bounded timeout)
//!     → registry prunes failures, persists iff something was dropped
//!
//! Aggregate /health (http::status):
//!     discover each service (rotates) → probe.rs → UP / DOWN
//! ```
//!
//! # Design Decisions
//! - A single failed probe evicts; instances re-register to come back
//! - Probes run outside the registry lock

pub mod probe;
pub mod sweep;

pub use probe::Prober;
pub use sweep::HealthSweeper;

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (split /api/{service}/{rest})
//!     → service.rs (is the name one of the breaker-guarded services?)
//!     → Return: RouteTarget + optional KnownService
//! ```
//!
//! # Design Decisions
//! - The known service set is a closed enum, not a string-keyed lookup
//! - Unknown names are not rejected here; the registry decides 404

pub mod router;
pub mod service;

pub use router::RouteTarget;
pub use service::KnownService;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → proxy.rs   /api/{service}/{rest...}
//!     → status.rs  GET /health
//!     → admin      /registry, /breakers
//!     → client.rs  (downstream calls and probes)
//! ```

pub mod client;
pub mod proxy;
pub mod server;
pub mod status;

pub use server::{GatewayServer, X_REQUEST_ID};

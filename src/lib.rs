//! API gateway with a persisted service registry and per-service circuit breakers.

pub mod admin;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod routing;
pub mod state;

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, PersistenceError};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use state::GatewayState;

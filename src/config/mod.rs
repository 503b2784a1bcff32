//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (GATEWAY_CONFIG)
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, BreakerConfig, GatewayConfig, ListenerConfig, ObservabilityConfig,
    RegistryConfig,
};

//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     store.rs (read JSON, or create empty)
//!     → table.rs (normalized RegistryTable)
//!     → service.rs (ServiceRegistry behind one async mutex)
//!
//! register / unregister / discover:
//!     lock → mutate table → store.rs rewrites the whole document → unlock
//!
//! Health sweep (health::sweep):
//!     snapshot instances → probe without the lock → lock → prune → persist if changed
//! ```
//!
//! # Design Decisions
//! - Round-robin is rotate-on-read: discover moves the head to the tail
//! - No cursor per service, so removals mid-rotation need no fix-up
//! - Mutations are persisted before the caller sees success

pub mod service;
pub mod store;
pub mod table;

pub use service::ServiceRegistry;
pub use store::RegistryStore;
pub use table::{RegistryTable, ServiceInstance};

//! The `services` module provides a high-level API for interacting with the
//! database. It encapsulates the SQL so the rest of the application (HTTP
//! handlers, the dispatcher) works with domain models without knowing the
//! underlying schema or queries.
//!
//! Organized into sub-modules per domain entity; all public functions are
//! re-exported under `crate::db::services::`.

pub mod account_service;
pub mod delivery_service;
pub mod destination_service;
pub mod template_service;

pub use account_service::*;
pub use delivery_service::*;
pub use destination_service::*;
pub use template_service::*;

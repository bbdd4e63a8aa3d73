//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers receive their ports as `Arc<dyn Trait>` at construction.

pub mod handlers;

pub use handlers::billing;

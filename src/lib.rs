//! Strategy failover library.
//!
//! Watches the health of the active traffic-handling strategy and
//! switches to a previously verified backup after sustained failure.

// Core
pub mod failover;
pub mod gateway;
pub mod storage;

// Inputs and presentation
pub mod catalog;
pub mod health;

// Surfaces and cross-cutting concerns
pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::FailoverdConfig;
pub use failover::FailoverController;
pub use lifecycle::Shutdown;

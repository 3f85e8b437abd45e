//! equifund Library
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregate;
pub mod api;
pub mod domain;
pub mod engine;
pub mod store;

// Private modules (used only by main.rs binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, DomainError, DomainEvent, EventPublisher, OperationContext};
pub use error::{AppError, AppResult};

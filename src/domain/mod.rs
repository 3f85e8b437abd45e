//! Domain module
//!
//! Domain primitives, errors, events and operation context shared by the
//! engines. Everything here is independent of the web and storage layers.

mod context;
mod error;
mod events;
mod money;

pub use context::OperationContext;
pub use error::DomainError;
pub use events::{CollectingPublisher, DomainEvent, EventPublisher, TracingPublisher};
pub use money::{whole_shares, Amount, AmountError};

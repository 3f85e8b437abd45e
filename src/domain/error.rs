//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors
///
/// These errors represent business rule violations and domain invariant
/// failures. They are independent of the web/infrastructure layer and are
/// expected, recoverable-by-the-caller outcomes rather than defects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Referenced resource does not exist (user, campaign, investment, listing)
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Caller is not the owner of the resource
    #[error("{0}")]
    Forbidden(String),

    /// Business rule violation (state-machine rejection, insufficient shares,
    /// expired windows, duplicate listings, ...)
    #[error("{0}")]
    BusinessRule(String),

    /// Campaign version conflict (optimistic locking). Signals the caller to
    /// re-read and resubmit; never retried inside the engine.
    #[error("Campaign was updated by another transaction. Please retry")]
    ConcurrencyConflict { campaign_id: Uuid },
}

impl DomainError {
    /// Create a not-found error for a named resource
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a business rule violation
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule(message.into())
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Forbidden(_) | Self::BusinessRule(_)
        )
    }

    /// Check if this is a conflict error (re-read and resubmit may help)
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let id = Uuid::new_v4();
        let err = DomainError::not_found("Campaign", id);

        assert!(err.is_client_error());
        assert!(!err.is_conflict_error());
        assert!(err.to_string().contains("Campaign not found"));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_business_rule_error() {
        let err = DomainError::business_rule("Cooling-off period has expired");

        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Cooling-off period has expired");
    }

    #[test]
    fn test_concurrency_conflict_error() {
        let err = DomainError::ConcurrencyConflict {
            campaign_id: Uuid::new_v4(),
        };

        assert!(!err.is_client_error());
        assert!(err.is_conflict_error());
        assert_eq!(
            err.to_string(),
            "Campaign was updated by another transaction. Please retry"
        );
    }
}

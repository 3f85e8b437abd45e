//! Store Errors
//!
//! Error types for the storage ports. Persistence detail stays behind this
//! boundary; domain errors never originate here.

use thiserror::Error;

/// Errors that can occur in a store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row failed to map back into a domain value
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    pub fn invalid_row(message: impl Into<String>) -> Self {
        Self::InvalidRow(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_row_message() {
        let err = StoreError::invalid_row("Unknown campaign status: BOGUS");
        assert!(err.to_string().contains("Unknown campaign status"));
    }
}

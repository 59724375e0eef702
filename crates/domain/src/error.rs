//! Service error types.

use std::time::Duration;

use application_store::StoreError;
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by [`LoanApplicationService`](crate::LoanApplicationService).
///
/// A missing application or an ineligible transition is not an error; those
/// surface as `None` and `false`.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The request failed input validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A uniqueness rule rejected the write.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The store failed for a reason the caller cannot fix.
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// The operation did not complete before its deadline.
    #[error("Operation {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl From<StoreError> for ApplicationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { message, .. } => ApplicationError::Conflict { message },
            other => ApplicationError::Storage(other),
        }
    }
}

impl ApplicationError {
    /// Returns true if the caller's input was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApplicationError::Validation(_) | ApplicationError::Conflict { .. }
        )
    }
}

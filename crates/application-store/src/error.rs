use thiserror::Error;

/// Errors that can occur when interacting with the application store.
///
/// "No matching row" is never an error here: reads return `None` and
/// transitions return `false`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict on {constraint}: {message}")]
    Conflict { constraint: String, message: String },

    /// A stored row could not be decoded into the application model.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the error is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Result type for application store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

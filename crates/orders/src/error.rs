//! Checkout error taxonomy.

use thiserror::Error;

use agrostore_core::PresentationId;

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Everything that can go wrong placing or listing orders.
///
/// Validation, not-found and conflict are detected with no partial effect;
/// insufficient stock and storage failures surface only after the unit of
/// work has fully rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Empty or malformed line items, non-positive quantity, price drift.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced presentation no longer exists.
    #[error("presentation not found: {0}")]
    NotFound(PresentationId),

    /// A decrement would drive the presentation's stock negative.
    #[error("insufficient stock for presentation {presentation_id}: requested {requested}, available {available}")]
    InsufficientStock {
        presentation_id: PresentationId,
        requested: i64,
        available: i64,
    },

    /// Idempotency-key collision with a different payload.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The underlying transactional storage failed; the whole operation was
    /// rolled back and may be retried from the start.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CheckoutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

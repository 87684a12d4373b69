//! Error types for the order store.

use crate::model::Status;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The lifecycle does not allow this step (e.g. READY → PREPARING).
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },

    /// The stored status moved on before this change was applied.
    #[error("Status conflict: expected {expected}, found {actual}")]
    StatusConflict { expected: Status, actual: Status },

    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// An error occurred while communicating with the store actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::ActorCommunicationError(msg)
    }
}

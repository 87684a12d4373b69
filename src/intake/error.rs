use crate::kitchen::{QueueError, ValidationError};
use crate::menu_store::MenuError;
use crate::model::{OrderId, Status};
use crate::order_store::OrderError;
use crate::payment::PaymentError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order was stored but the kitchen queue is full. Retry with `requeue`.
    #[error("Kitchen is at capacity; order {order_id} is saved but not queued")]
    Capacity { order_id: OrderId },

    #[error("Missing lat/lng")]
    MissingCoordinates,

    #[error("Payment failed: {0}")]
    PaymentFailed(#[from] PaymentError),

    #[error("Order {order_id} is {status}")]
    InvalidState { order_id: OrderId, status: Status },

    #[error(transparent)]
    Store(OrderError),

    #[error(transparent)]
    Menu(#[from] MenuError),
}

impl IntakeError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            IntakeError::Capacity { .. } => true,
            IntakeError::Validation(ValidationError::CatalogUnavailable(_)) => true,
            IntakeError::Store(OrderError::ActorCommunicationError(_)) => true,
            IntakeError::Menu(MenuError::ActorCommunicationError(_)) => true,
            IntakeError::PaymentFailed(PaymentError::Declined(_)) => true,
            _ => false,
        }
    }
}

impl From<OrderError> for IntakeError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => IntakeError::NotFound(id),
            other => IntakeError::Store(other),
        }
    }
}

impl From<QueueError> for IntakeError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Full { order_id, .. } => IntakeError::Capacity { order_id },
        }
    }
}

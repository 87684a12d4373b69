use crate::model::{OrderId, Status};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Text of the extra notification sent when an order becomes `READY`.
pub const READY_MESSAGE: &str = "Your order is ready!";

/// Payload of a `status` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: Status,
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
}

/// A named event pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum OrderEvent {
    /// Current status at subscribe time.
    Init(Status),
    /// A transition that just happened.
    Status(StatusChange),
    /// Free-text message for the customer.
    Notification(String),
}

impl OrderEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::Init(_) => "init",
            OrderEvent::Status(_) => "status",
            OrderEvent::Notification(_) => "notification",
        }
    }

    /// Event data on the wire: the status name, a JSON object, or plain text.
    pub fn data(&self) -> String {
        match self {
            OrderEvent::Init(status) => status.to_string(),
            OrderEvent::Status(change) => serde_json::to_string(change).unwrap_or_default(),
            OrderEvent::Notification(message) => message.clone(),
        }
    }

    /// Status carried by this event, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            OrderEvent::Init(status) => Some(*status),
            OrderEvent::Status(change) => Some(change.status),
            OrderEvent::Notification(_) => None,
        }
    }
}

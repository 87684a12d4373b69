use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Lifecycle stage of an order.
///
/// The happy path only ever moves forward one step at a time:
/// `RECEIVED → PREPARING → READY → OUT_FOR_DELIVERY → DELIVERED`.
/// `CANCELLED` can be reached from any status that is not already terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Received,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl Status {
    /// The successor on the happy path, if any.
    pub fn next(self) -> Option<Status> {
        match self {
            Status::Received => Some(Status::Preparing),
            Status::Preparing => Some(Status::Ready),
            Status::Ready => Some(Status::OutForDelivery),
            Status::OutForDelivery => Some(Status::Delivered),
            Status::Delivered | Status::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Delivered | Status::Cancelled)
    }

    /// Whether `self → to` is a legal single transition.
    pub fn can_transition_to(self, to: Status) -> bool {
        if to == Status::Cancelled {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }

    /// Wire name, e.g. `OUT_FOR_DELIVERY`.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Received => "RECEIVED",
            Status::Preparing => "PREPARING",
            Status::Ready => "READY",
            Status::OutForDelivery => "OUT_FOR_DELIVERY",
            Status::Delivered => "DELIVERED",
            Status::Cancelled => "CANCELLED",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: [Status; 5] = [
        Status::Received,
        Status::Preparing,
        Status::Ready,
        Status::OutForDelivery,
        Status::Delivered,
    ];

    #[test]
    fn test_happy_path_only_moves_one_step_forward() {
        for (i, from) in HAPPY_PATH.iter().enumerate() {
            for (j, to) in HAPPY_PATH.iter().enumerate() {
                assert_eq!(from.can_transition_to(*to), j == i + 1, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_cancel_only_from_non_terminal() {
        for status in HAPPY_PATH {
            assert_eq!(status.can_transition_to(Status::Cancelled), status != Status::Delivered);
        }
        assert!(!Status::Cancelled.can_transition_to(Status::Cancelled));
        assert!(!Status::Cancelled.can_transition_to(Status::Received));
        assert_eq!(Status::Cancelled.next(), None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Status::OutForDelivery).unwrap(), "\"OUT_FOR_DELIVERY\"");
        let parsed: Status = serde_json::from_str("\"READY\"").unwrap();
        assert_eq!(parsed, Status::Ready);
        assert_eq!(Status::Delivered.to_string(), "DELIVERED");
    }
}

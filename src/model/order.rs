//! Customer orders.
//!
//! # Record Store
//! [`Order`] implements the [`ActorEntity`](crate::framework::ActorEntity) trait
//! and lives in the order store. Everything else in the pipeline passes the
//! [`OrderId`] around and reloads the record when it needs it.
//!
//! See [`impl ActorEntity for Order`](crate::order_store::entity) for details on:
//! - Creation parameters ([`OrderCreate`])
//! - Updates ([`OrderUpdate`]) and status changes ([`OrderAction`])
use crate::model::{MenuItemId, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-unique order identifier, e.g. `ORD1760800000-42`.
pub type OrderId = String;

/// A menu item as it was when the order was placed.
///
/// `unit_price` is copied from the menu so later price changes never touch
/// existing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderLine {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    lines: Vec<OrderLine>,
    pub total: f64,
    pub status: Status,
    pub delivery: Option<DeliveryLocation>,
    pub eta_seconds: Option<u64>,
    pub paid: bool,
}

impl Order {
    /// Creates a new order in `RECEIVED`.
    pub fn new(id: OrderId, params: OrderCreate) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            customer_name: params.customer_name,
            customer_phone: params.customer_phone,
            lines: params.lines,
            total: params.total,
            status: Status::Received,
            delivery: None,
            eta_seconds: None,
            paid: false,
        }
    }

    /// Line items; fixed once the order exists.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Sum of quantities over all lines, saturating at `u32::MAX`.
    pub fn total_units(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |units, l| units.saturating_add(l.quantity))
    }
}

/// A validated, priced order that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreate {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total: f64,
}

/// Field updates that do not touch the lifecycle.
#[derive(Debug, Clone)]
pub enum OrderUpdate {
    SetDelivery {
        location: DeliveryLocation,
        eta_seconds: u64,
    },
    MarkPaid,
}

/// Lifecycle changes, applied atomically by the order store.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Move from `from` to `to`, failing if the stored status is no longer `from`.
    Advance { from: Status, to: Status },
    Cancel,
}

#[derive(Debug, Clone)]
pub enum OrderQuery {
    Status(Status),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(menu_item_id: MenuItemId, quantity: u32) -> OrderLine {
        OrderLine {
            menu_item_id,
            name: format!("item {menu_item_id}"),
            quantity,
            unit_price: 1.0,
        }
    }

    fn order_with(lines: Vec<OrderLine>) -> Order {
        Order::new(
            "ORD1-1".into(),
            OrderCreate {
                customer_name: "Asha".into(),
                customer_phone: None,
                lines,
                total: 1.0,
            },
        )
    }

    #[test]
    fn test_total_units() {
        assert_eq!(order_with(vec![line(1, 2), line(5, 1)]).total_units(), 3);
    }

    #[test]
    fn test_total_units_saturates() {
        let max = i32::MAX as u32;
        let order = order_with(vec![line(1, max), line(2, max), line(3, max)]);
        assert_eq!(order.total_units(), u32::MAX);
    }
}

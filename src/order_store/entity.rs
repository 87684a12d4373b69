//! [`ActorEntity`] implementation for [`Order`].
//!
//! The store is the only place an order's status changes, and it only
//! changes through [`OrderAction`]. Because the store actor handles one
//! message at a time, `Advance` is a compare-and-set: whichever worker's
//! request arrives first wins, the other sees a [`OrderError::StatusConflict`].

use super::OrderError;
use crate::framework::ActorEntity;
use crate::model::{Order, OrderAction, OrderCreate, OrderId, OrderQuery, OrderUpdate, Status};
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Action = OrderAction;
    type ActionResult = Order;
    type Query = OrderQuery;
    type Context = ();
    type Error = OrderError;

    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, OrderError> {
        if params.lines.is_empty() {
            return Err(OrderError::ValidationError("order has no lines".into()));
        }
        Ok(Order::new(id, params))
    }

    fn matches(&self, query: &OrderQuery) -> bool {
        match query {
            OrderQuery::Status(status) => self.status == *status,
        }
    }

    async fn on_update(&mut self, update: OrderUpdate, _ctx: &()) -> Result<(), OrderError> {
        match update {
            OrderUpdate::SetDelivery {
                location,
                eta_seconds,
            } => {
                self.delivery = Some(location);
                self.eta_seconds = Some(eta_seconds);
            }
            OrderUpdate::MarkPaid => self.paid = true,
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: OrderAction, _ctx: &()) -> Result<Order, OrderError> {
        let (from, to) = match action {
            OrderAction::Advance { from, to } => (from, to),
            OrderAction::Cancel => (self.status, Status::Cancelled),
        };
        if self.status != from {
            return Err(OrderError::StatusConflict {
                expected: from,
                actual: self.status,
            });
        }
        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }
        self.status = to;
        Ok(self.clone())
    }
}

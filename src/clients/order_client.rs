//! # Order Client
//!
//! High-level API over the order store. Status changes go through
//! [`OrderClient::advance`] so the store can reject stale or illegal ones.
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{
    DeliveryLocation, Order, OrderAction, OrderCreate, OrderId, OrderQuery, OrderUpdate, Status,
};
use crate::order_store::OrderError;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Client for interacting with the order store.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Persists a priced order; the store assigns its id.
    #[instrument(skip(self, params), fields(customer = %params.customer_name))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<Order, OrderError> {
        debug!(?params, "create_order called");
        let order = self.inner.create(params).await.map_err(Self::map_error)?;
        info!(order_id = %order.id, total = order.total, "Order stored");
        Ok(order)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Order>, OrderError> {
        self.get(id.to_string()).await
    }

    pub async fn find_all_by_id(&self, ids: Vec<OrderId>) -> Result<Vec<Order>, OrderError> {
        self.get_many(ids).await
    }

    pub async fn find_by_status(&self, status: Status) -> Result<Vec<Order>, OrderError> {
        self.query(OrderQuery::Status(status)).await
    }

    /// Moves the order from `from` to `to` if it is still at `from`.
    #[instrument(skip(self))]
    pub async fn advance(&self, id: &str, from: Status, to: Status) -> Result<Order, OrderError> {
        self.inner
            .perform_action(id.to_string(), OrderAction::Advance { from, to })
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: &str) -> Result<Order, OrderError> {
        self.inner
            .perform_action(id.to_string(), OrderAction::Cancel)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn set_delivery(
        &self,
        id: &str,
        location: DeliveryLocation,
        eta_seconds: u64,
    ) -> Result<Order, OrderError> {
        self.inner
            .update(
                id.to_string(),
                OrderUpdate::SetDelivery {
                    location,
                    eta_seconds,
                },
            )
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn mark_paid(&self, id: &str) -> Result<Order, OrderError> {
        self.inner
            .update(id.to_string(), OrderUpdate::MarkPaid)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        if let Some(order_error) = e.entity_error::<OrderError>() {
            return order_error.clone();
        }
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

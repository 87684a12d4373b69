use super::dto::*;
use super::error::IntakeError;
use crate::clients::{MenuClient, OrderClient};
use crate::eta::{DirectionsProvider, EtaEstimator, GeoPoint};
use crate::kitchen::{OrderValidator, PreparationQueue};
use crate::model::{DeliveryLocation, MenuItem, Order, Status};
use crate::notify::{NotificationHub, Subscription};
use crate::order_store::OrderError;
use crate::payment::PaymentGateway;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Front door of the pipeline. Cheap to clone.
#[derive(Clone)]
pub struct IntakeService {
    menu: MenuClient,
    orders: OrderClient,
    validator: OrderValidator,
    queue: PreparationQueue,
    hub: NotificationHub,
    eta: EtaEstimator,
    directions: Arc<dyn DirectionsProvider>,
    payments: PaymentGateway,
}

impl IntakeService {
    pub fn new(
        menu: MenuClient,
        orders: OrderClient,
        queue: PreparationQueue,
        hub: NotificationHub,
        eta: EtaEstimator,
        directions: Arc<dyn DirectionsProvider>,
        payments: PaymentGateway,
    ) -> Self {
        Self {
            validator: OrderValidator::new(menu.clone()),
            menu,
            orders,
            queue,
            hub,
            eta,
            directions,
            payments,
        }
    }

    /// The whole menu, or one category of it when `category` is not blank.
    pub async fn menu(&self, category: Option<&str>) -> Result<Vec<MenuItem>, IntakeError> {
        let items = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => self.menu.find_by_category(category).await?,
            None => self.menu.find_all().await?,
        };
        Ok(items)
    }

    /// Validates, stores and queues a new order.
    ///
    /// If the queue is full the order stays stored as `RECEIVED` and
    /// [`IntakeError::Capacity`] is returned.
    #[instrument(skip(self, request), fields(customer = %request.customer_name))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlaceOrderResponse, IntakeError> {
        let params = self
            .validator
            .validate(&request.customer_name, request.customer_phone, &request.items)
            .await
            .inspect_err(|e| warn!(error = %e, "Order rejected"))?;

        let order = self.orders.create_order(params).await?;
        self.queue.enqueue(order.id.clone()).inspect_err(|e| {
            warn!(order_id = %order.id, error = %e, "Order stored but not queued");
        })?;
        info!(order_id = %order.id, total = order.total, "Order accepted");

        Ok(PlaceOrderResponse {
            payment_token: self.payments.create_intent(&order.id),
            order_id: order.id,
            status: order.status,
            total: order.total,
        })
    }

    /// Puts a stored `RECEIVED` order back on the kitchen queue.
    #[instrument(skip(self))]
    pub async fn requeue(&self, order_id: &str) -> Result<(), IntakeError> {
        let order = self.load(order_id).await?;
        if order.status != Status::Received {
            return Err(IntakeError::InvalidState {
                order_id: order.id,
                status: order.status,
            });
        }
        self.queue.enqueue(order.id)?;
        Ok(())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, IntakeError> {
        self.load(order_id).await
    }

    /// Records the delivery location and returns the new ETA.
    #[instrument(skip(self))]
    pub async fn track(&self, order_id: &str, request: TrackRequest) -> Result<TrackResponse, IntakeError> {
        self.load(order_id).await?;
        let (Some(lat), Some(lng)) = (request.lat, request.lng) else {
            return Err(IntakeError::MissingCoordinates);
        };

        let eta_seconds = self
            .eta
            .estimate_with_directions(self.directions.as_ref(), GeoPoint::new(lat, lng))
            .await;
        self.orders
            .set_delivery(order_id, DeliveryLocation { lat, lng }, eta_seconds)
            .await?;
        info!(%order_id, eta_seconds, "Delivery location updated");
        Ok(TrackResponse { eta_seconds })
    }

    #[instrument(skip(self, request))]
    pub async fn pay(&self, order_id: &str, request: PayRequest) -> Result<PayResponse, IntakeError> {
        let order = self.load(order_id).await?;
        if order.paid {
            return Ok(PayResponse::paid());
        }
        self.payments
            .capture(&order.id, request.payment_token.as_deref())?;
        self.orders.mark_paid(&order.id).await?;
        Ok(PayResponse::paid())
    }

    /// Cancels a non-terminal order and tells its subscriber.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: &str) -> Result<Order, IntakeError> {
        match self.orders.cancel(order_id).await {
            Ok(order) => {
                self.hub.publish(&order);
                info!(%order_id, "Order cancelled");
                Ok(order)
            }
            Err(OrderError::InvalidTransition { from, .. }) => Err(IntakeError::InvalidState {
                order_id: order_id.to_string(),
                status: from,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn subscribe(&self, order_id: &str) -> Subscription {
        self.hub.subscribe(order_id).await
    }

    async fn load(&self, order_id: &str) -> Result<Order, IntakeError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| IntakeError::NotFound(order_id.to_string()))
    }
}

//! # Kitchen Worker Pool
//!
//! A fixed number of Tokio tasks, each running the same loop:
//!
//! 1. wait (bounded) for an order id from the [`PreparationQueue`],
//! 2. reload the order from the store,
//! 3. if it is still `RECEIVED`, drive it to `DELIVERED`.
//!
//! ## State machine
//!
//! | Step | Transition | Then |
//! |------|------------|------|
//! | claim | RECEIVED → PREPARING | wait `clamp(4s, 60s, 3s × units)` |
//! | ready | PREPARING → READY | (hub adds the ready notification) |
//! | dispatch | READY → OUT_FOR_DELIVERY | wait `clamp(10s, 45s, eta)` or 15s without an ETA |
//! | deliver | OUT_FOR_DELIVERY → DELIVERED | (hub closes the subscription) |
//!
//! Every transition is a compare-and-set in the order store followed
//! immediately by a publish, with no suspension point in between that shutdown
//! could interrupt. A record is therefore never left "updated but not notified".
//!
//! ## Fault isolation
//!
//! [`Kitchen::process_order`] returns a `Result`. The loop logs an `Err` and
//! moves on to the next id, so one bad order never stops a worker.
//!
//! ## Shutdown
//!
//! Workers watch a shutdown flag while waiting on the queue and while in a
//! simulated delay, and leave promptly from either.

use super::clock::Delay;
use super::queue::PreparationQueue;
use crate::clients::OrderClient;
use crate::model::{Order, OrderId, Status};
use crate::notify::NotificationHub;
use crate::order_store::OrderError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Simulated kitchen and delivery timings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KitchenTiming {
    pub per_unit: Duration,
    pub min_preparation: Duration,
    pub max_preparation: Duration,
    pub min_delivery: Duration,
    pub max_delivery: Duration,
    pub default_delivery: Duration,
}

impl Default for KitchenTiming {
    fn default() -> Self {
        Self {
            per_unit: Duration::from_secs(3),
            min_preparation: Duration::from_secs(4),
            max_preparation: Duration::from_secs(60),
            min_delivery: Duration::from_secs(10),
            max_delivery: Duration::from_secs(45),
            default_delivery: Duration::from_secs(15),
        }
    }
}

impl KitchenTiming {
    /// `clamp(min, max, per_unit × units)`.
    pub fn preparation(&self, total_units: u32) -> Duration {
        self.per_unit
            .saturating_mul(total_units)
            .clamp(self.min_preparation, self.max_preparation)
    }

    /// `clamp(min, max, eta)` for a known ETA, the default otherwise.
    pub fn delivery(&self, eta_seconds: Option<u64>) -> Duration {
        match eta_seconds {
            Some(eta) => Duration::from_secs(eta).clamp(self.min_delivery, self.max_delivery),
            None => self.default_delivery,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkerError {
    #[error("order store failed during {step}: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: OrderError,
    },
}

/// What happened to one dequeued order.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Delivered,
    /// Nothing to do: missing, already claimed, or no longer `RECEIVED`.
    Skipped(String),
    /// Someone cancelled the order while it was being worked on.
    Cancelled { at: Status },
    /// Shutdown arrived mid-flight; the order stays at its last persisted status.
    Interrupted { at: Status },
}

/// Everything a worker needs, shared by all workers of a pool.
pub struct Kitchen {
    orders: OrderClient,
    queue: PreparationQueue,
    hub: NotificationHub,
    delay: Arc<dyn Delay>,
    timing: KitchenTiming,
}

impl Kitchen {
    pub fn new(
        orders: OrderClient,
        queue: PreparationQueue,
        hub: NotificationHub,
        delay: Arc<dyn Delay>,
        timing: KitchenTiming,
    ) -> Self {
        Self {
            orders,
            queue,
            hub,
            delay,
            timing,
        }
    }

    /// Runs one order through the state machine.
    pub async fn process_order(
        &self,
        order_id: &str,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Outcome, WorkerError> {
        let Some(order) = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(|source| WorkerError::Store { step: "load", source })?
        else {
            return Ok(Outcome::Skipped("order not found".into()));
        };
        if order.status != Status::Received {
            return Ok(Outcome::Skipped(format!("order is {}", order.status)));
        }

        let order = match self.transition(order_id, Status::Received, Status::Preparing, "claim").await? {
            Step::Moved(order) => order,
            Step::Lost(actual) => return Ok(Outcome::Skipped(format!("claimed elsewhere ({actual})"))),
        };

        let preparing = self.timing.preparation(order.total_units());
        debug!(%order_id, units = order.total_units(), ?preparing, "Preparing");
        if !self.wait(preparing, shutdown).await {
            return Ok(Outcome::Interrupted { at: Status::Preparing });
        }

        if let Step::Lost(at) = self.transition(order_id, Status::Preparing, Status::Ready, "ready").await? {
            return Ok(Outcome::Cancelled { at });
        }
        let order = match self
            .transition(order_id, Status::Ready, Status::OutForDelivery, "dispatch")
            .await?
        {
            Step::Moved(order) => order,
            Step::Lost(at) => return Ok(Outcome::Cancelled { at }),
        };

        let delivering = self.timing.delivery(order.eta_seconds);
        debug!(%order_id, eta = ?order.eta_seconds, ?delivering, "Out for delivery");
        if !self.wait(delivering, shutdown).await {
            return Ok(Outcome::Interrupted {
                at: Status::OutForDelivery,
            });
        }

        match self
            .transition(order_id, Status::OutForDelivery, Status::Delivered, "deliver")
            .await?
        {
            Step::Moved(_) => Ok(Outcome::Delivered),
            Step::Lost(at) => Ok(Outcome::Cancelled { at }),
        }
    }

    /// Persists `from → to` and notifies. A conflict means someone else moved
    /// the order (in practice: cancelled it) and is reported as [`Step::Lost`].
    async fn transition(
        &self,
        order_id: &str,
        from: Status,
        to: Status,
        step: &'static str,
    ) -> Result<Step, WorkerError> {
        match self.orders.advance(order_id, from, to).await {
            Ok(order) => {
                self.hub.publish(&order);
                info!(%order_id, status = %order.status, "Order status changed");
                Ok(Step::Moved(order))
            }
            Err(OrderError::StatusConflict { actual, .. }) => {
                warn!(%order_id, expected = %from, %actual, "Order moved underneath worker");
                Ok(Step::Lost(actual))
            }
            Err(source) => Err(WorkerError::Store { step, source }),
        }
    }

    /// Waits `duration` unless shutdown comes first. Returns `false` on shutdown.
    async fn wait(&self, duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = stopped(shutdown) => false,
            _ = self.delay.sleep(duration) => true,
        }
    }

    async fn run_worker(
        self: Arc<Self>,
        worker: usize,
        mut shutdown: watch::Receiver<bool>,
        dequeue_timeout: Duration,
    ) {
        info!(worker, "Kitchen worker started");
        loop {
            let next: Option<OrderId> = tokio::select! {
                _ = stopped(&mut shutdown) => break,
                next = self.queue.dequeue(dequeue_timeout) => next,
            };
            let Some(order_id) = next else {
                continue;
            };

            match self.process_order(&order_id, &mut shutdown).await {
                Ok(Outcome::Delivered) => info!(worker, %order_id, "Order delivered"),
                Ok(Outcome::Skipped(reason)) => debug!(worker, %order_id, %reason, "Order skipped"),
                Ok(Outcome::Cancelled { at }) => info!(worker, %order_id, %at, "Order cancelled in flight"),
                Ok(Outcome::Interrupted { at }) => {
                    info!(worker, %order_id, %at, "Order interrupted by shutdown");
                    break;
                }
                Err(e) => error!(worker, %order_id, error = %e, "Order processing failed"),
            }
        }
        info!(worker, "Kitchen worker stopped");
    }
}

enum Step {
    Moved(Order),
    Lost(Status),
}

/// Resolves once shutdown is requested or the pool handle is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// A running set of kitchen workers.
pub struct KitchenWorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl KitchenWorkerPool {
    /// Spawns `worker_count` workers (at least one) sharing `kitchen`.
    pub fn start(kitchen: Kitchen, worker_count: usize, dequeue_timeout: Duration) -> Self {
        let kitchen = Arc::new(kitchen);
        let (shutdown, _) = watch::channel(false);
        let handles = (0..worker_count.max(1))
            .map(|worker| {
                tokio::spawn(kitchen.clone().run_worker(
                    worker,
                    shutdown.subscribe(),
                    dequeue_timeout,
                ))
            })
            .collect();
        Self { shutdown, handles }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Signals every worker and waits for all of them to exit.
    pub async fn shutdown(self) -> Result<(), String> {
        info!(workers = self.handles.len(), "Stopping kitchen workers");
        self.shutdown.send_replace(true);

        let mut failures = Vec::new();
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Kitchen worker failed: {:?}", e);
                failures.push(format!("{:?}", e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(format!("Kitchen workers failed: {}", failures.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ActorClient;
    use crate::framework::mock::MockClient;
    use crate::framework::FrameworkError;
    use crate::kitchen::clock::RecordingDelay;
    use crate::model::{OrderCreate, OrderLine};
    use crate::notify::{Completion, OrderEvent};

    fn lines(quantities: &[u32]) -> Vec<OrderLine> {
        quantities
            .iter()
            .enumerate()
            .map(|(i, q)| OrderLine {
                menu_item_id: i as u64 + 1,
                name: format!("item {i}"),
                quantity: *q,
                unit_price: 1.0,
            })
            .collect()
    }

    struct Fixture {
        kitchen: Kitchen,
        orders: OrderClient,
        hub: NotificationHub,
        delay: Arc<RecordingDelay>,
        _store: JoinHandle<()>,
    }

    fn fixture() -> Fixture {
        let (actor, orders) = crate::order_store::new(32);
        let store = tokio::spawn(actor.run(()));
        let hub = NotificationHub::new(orders.clone(), 16);
        let delay = Arc::new(RecordingDelay::new());
        let kitchen = Kitchen::new(
            orders.clone(),
            PreparationQueue::new(16),
            hub.clone(),
            delay.clone(),
            KitchenTiming::default(),
        );
        Fixture {
            kitchen,
            orders,
            hub,
            delay,
            _store: store,
        }
    }

    async fn place(orders: &OrderClient, quantities: &[u32]) -> Order {
        orders
            .create_order(OrderCreate {
                customer_name: "Asha".into(),
                customer_phone: None,
                lines: lines(quantities),
                total: 1.0,
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_preparation_duration_is_clamped() {
        let timing = KitchenTiming::default();
        assert_eq!(timing.preparation(1), Duration::from_millis(4000));
        assert_eq!(timing.preparation(2), Duration::from_millis(6000));
        assert_eq!(timing.preparation(7), Duration::from_millis(21000));
        assert_eq!(timing.preparation(20), Duration::from_millis(60000));
        assert_eq!(timing.preparation(u32::MAX), Duration::from_millis(60000));
    }

    #[test]
    fn test_delivery_duration() {
        let timing = KitchenTiming::default();
        assert_eq!(timing.delivery(None), Duration::from_secs(15));
        assert_eq!(timing.delivery(Some(300)), Duration::from_secs(45));
        assert_eq!(timing.delivery(Some(3)), Duration::from_secs(10));
        assert_eq!(timing.delivery(Some(30)), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_order_walks_the_full_lifecycle() {
        let f = fixture();
        let order = place(&f.orders, &[2, 3]).await;
        f.orders
            .set_delivery(&order.id, crate::model::DeliveryLocation { lat: 0.0, lng: 0.0 }, 20)
            .await
            .unwrap();
        let sub = f.hub.subscribe(&order.id).await;

        let (_tx, mut shutdown) = watch::channel(false);
        let outcome = f.kitchen.process_order(&order.id, &mut shutdown).await.unwrap();
        assert_eq!(outcome, Outcome::Delivered);

        let (events, completion) = sub.collect().await;
        let statuses: Vec<Status> = events.iter().filter_map(OrderEvent::status).collect();
        assert_eq!(
            statuses,
            vec![
                Status::Received,
                Status::Preparing,
                Status::Ready,
                Status::OutForDelivery,
                Status::Delivered
            ]
        );
        assert!(events.contains(&OrderEvent::Notification("Your order is ready!".into())));
        assert_eq!(completion, Completion::Finished);
        assert_eq!(
            f.delay.recorded(),
            vec![Duration::from_secs(15), Duration::from_secs(20)]
        );

        let stored = f.orders.get(order.id.clone()).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Delivered);
    }

    #[tokio::test]
    async fn test_huge_unit_count_caps_preparation() {
        let f = fixture();
        let max = i32::MAX as u32;
        let order = place(&f.orders, &[max, max, max]).await;

        let (_tx, mut shutdown) = watch::channel(false);
        let outcome = f.kitchen.process_order(&order.id, &mut shutdown).await.unwrap();
        assert_eq!(outcome, Outcome::Delivered);
        assert_eq!(
            f.delay.recorded(),
            vec![Duration::from_secs(60), Duration::from_secs(15)]
        );
    }

    #[tokio::test]
    async fn test_already_processed_orders_are_skipped() {
        let f = fixture();
        let order = place(&f.orders, &[1]).await;
        f.orders
            .advance(&order.id, Status::Received, Status::Preparing)
            .await
            .unwrap();

        let (_tx, mut shutdown) = watch::channel(false);
        let outcome = f.kitchen.process_order(&order.id, &mut shutdown).await.unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));

        let missing = f.kitchen.process_order("ORD0-0", &mut shutdown).await.unwrap();
        assert_eq!(missing, Outcome::Skipped("order not found".into()));
        assert!(f.delay.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_mid_preparation_stops_cleanly() {
        struct CancelWhileCooking {
            orders: OrderClient,
            order_id: OrderId,
        }

        #[async_trait::async_trait]
        impl Delay for CancelWhileCooking {
            async fn sleep(&self, _duration: Duration) {
                let _ = self.orders.cancel(&self.order_id).await;
            }
        }

        let f = fixture();
        let order = place(&f.orders, &[1]).await;
        let kitchen = Kitchen::new(
            f.orders.clone(),
            PreparationQueue::new(4),
            f.hub.clone(),
            Arc::new(CancelWhileCooking {
                orders: f.orders.clone(),
                order_id: order.id.clone(),
            }),
            KitchenTiming::default(),
        );

        let (_tx, mut shutdown) = watch::channel(false);
        let outcome = kitchen.process_order(&order.id, &mut shutdown).await.unwrap();
        assert_eq!(outcome, Outcome::Cancelled { at: Status::Cancelled });

        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Cancelled);
    }

    #[tokio::test]
    async fn test_store_failure_is_returned_not_raised() {
        let mock = MockClient::<Order>::new();
        mock.expect_get().return_err(FrameworkError::ActorClosed);
        let orders = OrderClient::new(mock.client());
        let kitchen = Kitchen::new(
            orders.clone(),
            PreparationQueue::new(4),
            NotificationHub::new(orders, 4),
            Arc::new(RecordingDelay::new()),
            KitchenTiming::default(),
        );

        let (_tx, mut shutdown) = watch::channel(false);
        let err = kitchen.process_order("ORD1-1", &mut shutdown).await.unwrap_err();
        assert!(matches!(err, WorkerError::Store { step: "load", .. }));
        mock.verify();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_simulated_delay() {
        let (actor, orders) = crate::order_store::new(8);
        tokio::spawn(actor.run(()));
        let hub = NotificationHub::new(orders.clone(), 8);
        let kitchen = Kitchen::new(
            orders.clone(),
            PreparationQueue::new(4),
            hub,
            Arc::new(crate::kitchen::clock::TokioDelay),
            KitchenTiming::default(),
        );
        let order = place(&orders, &[1]).await;

        let (tx, mut shutdown) = watch::channel(false);
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send_replace(true);
        });

        let started = std::time::Instant::now();
        let outcome = kitchen.process_order(&order.id, &mut shutdown).await.unwrap();
        assert_eq!(outcome, Outcome::Interrupted { at: Status::Preparing });
        assert!(started.elapsed() < Duration::from_secs(2));
        stopper.await.unwrap();

        let stored = orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Preparing);
    }

    #[tokio::test]
    async fn test_pool_processes_queue_and_stops() {
        let f = fixture();
        let queue = PreparationQueue::new(16);
        let kitchen = Kitchen::new(
            f.orders.clone(),
            queue.clone(),
            f.hub.clone(),
            f.delay.clone(),
            KitchenTiming::default(),
        );
        let pool = KitchenWorkerPool::start(kitchen, 3, Duration::from_millis(20));
        assert_eq!(pool.worker_count(), 3);

        let mut subs = Vec::new();
        for _ in 0..5 {
            let order = place(&f.orders, &[1]).await;
            subs.push(f.hub.subscribe(&order.id).await);
            queue.enqueue(order.id.clone()).unwrap();
        }
        // Duplicate enqueue of an id that is already being handled.
        queue.enqueue(subs[0].order_id().to_string()).unwrap();

        for sub in subs {
            let (_, completion) = sub.collect().await;
            assert_eq!(completion, Completion::Finished);
        }
        let delivered = f.orders.find_by_status(Status::Delivered).await.unwrap();
        assert_eq!(delivered.len(), 5);

        pool.shutdown().await.unwrap();
    }
}

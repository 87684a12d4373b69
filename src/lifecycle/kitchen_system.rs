use crate::clients::{MenuClient, OrderClient};
use crate::config::PipelineConfig;
use crate::eta::{EtaEstimator, MapsDirections};
use crate::intake::IntakeService;
use crate::kitchen::{
    Delay, Kitchen, KitchenTiming, KitchenWorkerPool, PreparationQueue, QueueError, TokioDelay,
};
use crate::menu_store::MenuError;
use crate::model::{default_menu, Status};
use crate::notify::NotificationHub;
use crate::order_store::OrderError;
use crate::payment::PaymentGateway;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Menu seeding failed: {0}")]
    Menu(#[from] MenuError),

    #[error("Order store failed: {0}")]
    Store(#[from] OrderError),

    #[error("Task failed: {0}")]
    Task(String),
}

/// The running pipeline: both stores, the hub, the queue and the worker pool.
///
/// `KitchenSystem` is responsible for:
/// - **Wiring**: every component gets the clients it needs
/// - **Seeding**: the menu store starts with the house menu
/// - **Recovery**: orders still `RECEIVED` are put back on the queue
/// - **Shutdown**: workers first, then the stores
///
/// # Example
///
/// ```ignore
/// let system = KitchenSystem::start(PipelineConfig::from_env()).await?;
/// let placed = system.intake.place_order(request).await?;
/// let events = system.intake.subscribe(&placed.order_id).await;
/// // ...
/// system.shutdown().await?;
/// ```
pub struct KitchenSystem {
    pub intake: IntakeService,
    pub orders: OrderClient,
    pub menu: MenuClient,
    pub hub: NotificationHub,
    pub queue: PreparationQueue,
    pool: KitchenWorkerPool,
    handles: Vec<JoinHandle<()>>,
}

impl KitchenSystem {
    /// Starts the pipeline with real wall-clock delays.
    pub async fn start(config: PipelineConfig) -> Result<Self, SystemError> {
        Self::start_with(config, Arc::new(TokioDelay), KitchenTiming::default()).await
    }

    /// Starts the pipeline with an injected delay source and timings.
    pub async fn start_with(
        config: PipelineConfig,
        delay: Arc<dyn Delay>,
        timing: KitchenTiming,
    ) -> Result<Self, SystemError> {
        info!(workers = config.worker_count, queue = config.queue_capacity, "Starting kitchen");

        // 1. Stores
        let (order_actor, orders) = crate::order_store::new(config.store_buffer);
        let (menu_actor, menu) = crate::menu_store::new(config.store_buffer);
        let handles = vec![
            tokio::spawn(order_actor.run(())),
            tokio::spawn(menu_actor.run(())),
        ];

        let seeded = menu.seed(default_menu()).await?;
        info!(items = seeded, "Menu seeded");

        // 2. Shared pipeline pieces
        let queue = PreparationQueue::new(config.queue_capacity);
        let hub = NotificationHub::new(orders.clone(), config.subscriber_buffer);
        let intake = IntakeService::new(
            menu.clone(),
            orders.clone(),
            queue.clone(),
            hub.clone(),
            EtaEstimator::new(config.restaurant(), config.seconds_per_km),
            Arc::new(MapsDirections::new(config.maps_api_key.clone())),
            PaymentGateway::new(config.payment_success_rate),
        );

        // 3. Workers
        let kitchen = Kitchen::new(orders.clone(), queue.clone(), hub.clone(), delay, timing);
        let pool = KitchenWorkerPool::start(kitchen, config.worker_count, config.dequeue_timeout);

        let system = Self {
            intake,
            orders,
            menu,
            hub,
            queue,
            pool,
            handles,
        };
        system.recover_received().await?;
        Ok(system)
    }

    /// Re-queues every order still in `RECEIVED`. Returns how many were queued.
    ///
    /// Stops early, with a warning, if the queue fills up.
    pub async fn recover_received(&self) -> Result<usize, SystemError> {
        let waiting = self.orders.find_by_status(Status::Received).await?;
        let mut queued = 0;
        for order in waiting {
            match self.queue.enqueue(order.id) {
                Ok(()) => queued += 1,
                Err(QueueError::Full { order_id, .. }) => {
                    warn!(%order_id, queued, "Queue full during recovery");
                    break;
                }
            }
        }
        if queued > 0 {
            info!(queued, "Recovered waiting orders");
        }
        Ok(queued)
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Stops the workers, then the stores.
    ///
    /// The stores only exit once every client is gone, so callers must drop
    /// their own clones of `orders`, `menu`, `hub` and `intake` first.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down kitchen...");

        self.pool.shutdown().await.map_err(SystemError::Task)?;

        drop(self.intake);
        drop(self.hub);
        drop(self.queue);
        drop(self.orders);
        drop(self.menu);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Store task failed: {:?}", e);
                return Err(SystemError::Task(format!("Store task failed: {:?}", e)));
            }
        }

        info!("Kitchen shutdown complete.");
        Ok(())
    }
}

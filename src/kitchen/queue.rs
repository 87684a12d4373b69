//! # Preparation Queue
//!
//! Bounded FIFO of order ids between intake and the kitchen workers.
//!
//! `enqueue` never blocks. When the queue is full it returns
//! [`QueueError::Full`] and the caller decides what to do; the order itself is
//! already stored, so the condition is retryable.
//!
//! Workers share one receiver behind an async mutex, so each id is handed to
//! exactly one worker.

use crate::model::OrderId;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Default capacity of the kitchen queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueueError {
    #[error("Preparation queue is full ({capacity} orders waiting); {order_id} not queued")]
    Full { order_id: OrderId, capacity: usize },
}

#[derive(Clone)]
pub struct PreparationQueue {
    sender: mpsc::Sender<OrderId>,
    receiver: Arc<Mutex<mpsc::Receiver<OrderId>>>,
    capacity: usize,
}

impl PreparationQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            capacity,
        }
    }

    /// Adds `order_id` at the back, or reports that the queue is full.
    pub fn enqueue(&self, order_id: OrderId) -> Result<(), QueueError> {
        self.sender.try_send(order_id).map_err(|e| {
            // The queue owns its receiver, so Closed cannot happen while `self` exists.
            let order_id = match e {
                mpsc::error::TrySendError::Full(id) | mpsc::error::TrySendError::Closed(id) => id,
            };
            QueueError::Full {
                order_id,
                capacity: self.capacity,
            }
        })?;
        debug!(queued = self.len(), "Order enqueued");
        Ok(())
    }

    /// Waits up to `timeout` for the next id. `None` on timeout.
    pub async fn dequeue(&self, timeout: Duration) -> Option<OrderId> {
        tokio::time::timeout(timeout, async {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        })
        .await
        .ok()
        .flatten()
    }

    /// Number of ids currently waiting.
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

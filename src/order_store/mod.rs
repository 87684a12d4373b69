//! # Order Store
//!
//! The durable home of every [`Order`]. Intake creates records here, workers
//! advance them, and the notification hub reads them. Nobody else keeps a
//! copy that could drift from what is stored.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`Order`]
//! - [`error`] - [`OrderError`]
//! - [`new()`] - Factory that creates the store actor and its client
//!
//! ## Identifiers
//!
//! Ids look like `ORD<epoch-seconds>-<seq>`. The sequence number comes from a
//! process-wide counter, so two orders placed in the same second still get
//! distinct ids.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::OrderClient;
use crate::framework::ResourceActor;
use crate::model::{Order, OrderId};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static ORDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Mints the next order id.
pub fn next_order_id() -> OrderId {
    let seq = ORDER_SEQ.fetch_add(1, Ordering::SeqCst) + 1;
    format!("ORD{}-{}", Utc::now().timestamp(), seq)
}

/// Creates a new order store actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, OrderClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, next_order_id);
    let client = OrderClient::new(generic_client);
    (actor, client)
}

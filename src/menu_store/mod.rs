//! Menu catalog store. Seeded once, read by the order validator and intake.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::MenuClient;
use crate::framework::ResourceActor;
use crate::model::MenuItem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Creates a new menu store actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<MenuItem>, MenuClient) {
    let menu_id_counter = Arc::new(AtomicU64::new(1));
    let next_menu_id = move || menu_id_counter.fetch_add(1, Ordering::SeqCst);

    let (actor, generic_client) = ResourceActor::new(buffer_size, next_menu_id);
    let client = MenuClient::new(generic_client);

    (actor, client)
}

//! Per-order push notifications.

pub mod event;
pub mod hub;

pub use event::*;
pub use hub::*;

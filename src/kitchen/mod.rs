//! # Kitchen
//!
//! Everything between "order accepted" and "order delivered":
//!
//! - [`validator`] - checks and prices incoming orders against the menu
//! - [`queue`] - bounded FIFO of order ids waiting for a cook
//! - [`worker`] - the pool that drives each order through its lifecycle
//! - [`clock`] - injectable delay for the simulated prep and delivery time

pub mod clock;
pub mod queue;
pub mod validator;
pub mod worker;

pub use clock::*;
pub use queue::*;
pub use validator::*;
pub use worker::*;

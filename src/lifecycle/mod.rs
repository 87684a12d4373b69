//! Runtime orchestration.
//!
//! - [`KitchenSystem`] - starts, wires and stops every component
//! - [`setup_tracing`] - installs the logging subscriber

pub mod kitchen_system;
pub mod tracing;

pub use self::kitchen_system::*;
pub use self::tracing::*;

//! # ETA Estimator
//!
//! Delivery time from the restaurant to a customer location. The local
//! estimate is haversine distance times a speed factor, clamped to
//! 5-60 minutes. A [`DirectionsProvider`] can be consulted first.

pub mod directions;
pub mod estimator;

pub use directions::*;
pub use estimator::*;

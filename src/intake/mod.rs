//! # Intake
//!
//! The library-level request surface: place, track, pay, cancel and watch
//! orders. A transport layer (HTTP, CLI, ...) only has to map these calls and
//! their [`IntakeError`]s onto its own conventions.

pub mod dto;
pub mod error;
pub mod service;

pub use dto::*;
pub use error::*;
pub use service::*;

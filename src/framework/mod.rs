//! Generic record store built on the actor pattern.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that stored record types implement
//! - [`ResourceActor`] - The task that owns the records and serializes access to them
//! - [`ResourceClient`] - Cloneable handle used by everything else
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See the [`mock`] module for a store that answers from canned expectations.

pub mod core;
pub mod mock;

pub use core::*;

#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Kitchen Pipeline
//!
//! > **Order intake, preparation and delivery tracking for a food-delivery kitchen.**
//!
//! An order is validated and priced, stored, queued, picked up by a kitchen
//! worker and walked through
//! `RECEIVED → PREPARING → READY → OUT_FOR_DELIVERY → DELIVERED`.
//! Every step is pushed to whoever is watching that order.
//!
//! ## 🚀 Core Concepts
//!
//! ### Stores are actors
//! Orders and menu items live in [`ResourceActor`](framework::ResourceActor)s.
//! Each store runs in its own task and handles one request at a time, so a
//! read-check-write inside the store is atomic. Status changes are
//! compare-and-set actions: a worker that lost a race, or an order that was
//! cancelled underneath it, gets a `StatusConflict` rather than a silent
//! overwrite.
//!
//! ### Ids, not copies
//! Between steps the pipeline only carries the [`OrderId`](model::OrderId).
//! Workers reload the record before acting on it.
//!
//! ### Bounded everything
//! The kitchen queue, the store mailboxes and every subscriber channel are
//! bounded. A full kitchen queue is reported to the caller
//! ([`IntakeError::Capacity`](intake::IntakeError::Capacity)), a subscriber
//! that falls behind is dropped.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic store actor, its client and a [`MockClient`](framework::mock::MockClient)
//! for tests.
//!
//! ### 2. The Data ([`model`], [`order_store`], [`menu_store`], [`clients`])
//! Plain records, their store behaviour, and typed clients over the stores.
//!
//! ### 3. The Pipeline ([`kitchen`], [`notify`], [`eta`], [`payment`])
//! Validation, the preparation queue, the worker pool, the notification hub,
//! delivery estimates and the simulated payment provider.
//!
//! ### 4. The Surface ([`intake`], [`lifecycle`], [`config`])
//! [`IntakeService`](intake::IntakeService) is the request API,
//! [`KitchenSystem`](lifecycle::KitchenSystem) wires everything together,
//! [`PipelineConfig`](config::PipelineConfig) reads `KITCHEN_*` variables.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod clients;
pub mod config;
pub mod eta;
pub mod framework;
pub mod intake;
pub mod kitchen;
pub mod lifecycle;
pub mod menu_store;
pub mod model;
pub mod notify;
pub mod order_store;
pub mod payment;

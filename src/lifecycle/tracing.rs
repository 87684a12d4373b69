//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered
//! by `RUST_LOG`. Module paths are hidden; structured fields such as
//! `order_id`, `status` and `worker` carry the context instead.
//!
//! ```bash
//! # Lifecycle and transitions
//! RUST_LOG=info cargo run
//!
//! # Full payloads and store traffic
//! RUST_LOG=debug cargo run
//!
//! # Only the kitchen
//! RUST_LOG=kitchen_pipeline::kitchen=debug cargo run
//! ```
//!
//! A delivered order at `info` reads roughly like:
//!
//! ```text
//! INFO Order accepted order_id="ORD1760800000-1" total=18.97
//! INFO Order status changed order_id="ORD1760800000-1" status=PREPARING
//! INFO Order status changed order_id="ORD1760800000-1" status=READY
//! INFO Order status changed order_id="ORD1760800000-1" status=OUT_FOR_DELIVERY
//! INFO Order status changed order_id="ORD1760800000-1" status=DELIVERED
//! INFO Order delivered worker=0 order_id="ORD1760800000-1"
//! ```

/// Installs the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

//! # Payment Gateway
//!
//! Simulated payment provider. Creating an intent always works and yields a
//! synthetic token; capturing it succeeds with a configurable probability.

use crate::model::OrderId;
use thiserror::Error;
use tracing::{info, warn};

/// Probability that a capture succeeds when nothing else is configured.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.98;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Missing payment token")]
    MissingToken,

    #[error("Payment declined for {0}")]
    Declined(OrderId),
}

#[derive(Debug, Clone, Copy)]
pub struct PaymentGateway {
    success_rate: f64,
}

impl Default for PaymentGateway {
    fn default() -> Self {
        Self::new(DEFAULT_SUCCESS_RATE)
    }
}

impl PaymentGateway {
    /// `success_rate` is clamped to `[0, 1]`.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            DEFAULT_SUCCESS_RATE
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    /// Payment token handed back to the customer at order time.
    pub fn create_intent(&self, order_id: &str) -> String {
        format!("SIMULATED_PAYMENT_TOKEN_{order_id}")
    }

    pub fn capture(&self, order_id: &str, token: Option<&str>) -> Result<(), PaymentError> {
        if token.map_or(true, |t| t.trim().is_empty()) {
            warn!(%order_id, "Capture without token");
            return Err(PaymentError::MissingToken);
        }
        if rand::random::<f64>() < self.success_rate {
            info!(%order_id, "Payment captured");
            Ok(())
        } else {
            warn!(%order_id, "Payment declined");
            Err(PaymentError::Declined(order_id.to_string()))
        }
    }
}

//! Injectable delay used for the simulated kitchen and delivery work.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Something that can wait for a duration.
#[async_trait]
pub trait Delay: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock waiting on the Tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested duration.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in call order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
        tokio::task::yield_now().await;
    }
}

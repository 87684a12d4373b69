//! Runtime configuration, read from `KITCHEN_*` environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `KITCHEN_WORKERS` | `max(2, cores / 2)` |
//! | `KITCHEN_QUEUE_CAPACITY` | `5000` |
//! | `KITCHEN_DEQUEUE_TIMEOUT_MS` | `1000` |
//! | `KITCHEN_SUBSCRIBER_BUFFER` | `16` |
//! | `KITCHEN_STORE_BUFFER` | `32` |
//! | `KITCHEN_RESTAURANT_LAT` / `KITCHEN_RESTAURANT_LNG` | `12.9719` / `77.5946` |
//! | `KITCHEN_SECONDS_PER_KM` | `120` |
//! | `KITCHEN_PAYMENT_SUCCESS_RATE` | `0.98` |
//! | `KITCHEN_MAPS_API_KEY` | unset |

use crate::eta::{GeoPoint, DEFAULT_SECONDS_PER_KM};
use crate::kitchen::DEFAULT_QUEUE_CAPACITY;
use crate::payment::DEFAULT_SUCCESS_RATE;
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    #[serde(with = "millis")]
    pub dequeue_timeout: Duration,
    pub subscriber_buffer: usize,
    pub store_buffer: usize,
    pub restaurant_lat: f64,
    pub restaurant_lng: f64,
    pub seconds_per_km: f64,
    pub payment_success_rate: f64,
    pub maps_api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dequeue_timeout: Duration::from_secs(1),
            subscriber_buffer: 16,
            store_buffer: 32,
            restaurant_lat: 12.9719,
            restaurant_lng: 77.5946,
            seconds_per_km: DEFAULT_SECONDS_PER_KM,
            payment_success_rate: DEFAULT_SUCCESS_RATE,
            maps_api_key: None,
        }
    }
}

fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    (cores / 2).max(2)
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        override_with(&get, "KITCHEN_WORKERS", &mut config.worker_count);
        override_with(&get, "KITCHEN_QUEUE_CAPACITY", &mut config.queue_capacity);
        override_with(&get, "KITCHEN_SUBSCRIBER_BUFFER", &mut config.subscriber_buffer);
        override_with(&get, "KITCHEN_STORE_BUFFER", &mut config.store_buffer);
        override_with(&get, "KITCHEN_RESTAURANT_LAT", &mut config.restaurant_lat);
        override_with(&get, "KITCHEN_RESTAURANT_LNG", &mut config.restaurant_lng);
        override_with(&get, "KITCHEN_SECONDS_PER_KM", &mut config.seconds_per_km);
        override_with(&get, "KITCHEN_PAYMENT_SUCCESS_RATE", &mut config.payment_success_rate);

        let mut timeout_ms = config.dequeue_timeout.as_millis() as u64;
        override_with(&get, "KITCHEN_DEQUEUE_TIMEOUT_MS", &mut timeout_ms);
        config.dequeue_timeout = Duration::from_millis(timeout_ms);

        if let Some(key) = get("KITCHEN_MAPS_API_KEY") {
            config.maps_api_key = Some(key);
        }
        if config.worker_count == 0 {
            warn!("KITCHEN_WORKERS must be at least 1, using 1");
            config.worker_count = 1;
        }
        if config.store_buffer == 0 {
            warn!("KITCHEN_STORE_BUFFER must be at least 1, using 1");
            config.store_buffer = 1;
        }
        config
    }

    pub fn restaurant(&self) -> GeoPoint {
        GeoPoint::new(self.restaurant_lat, self.restaurant_lng)
    }
}

fn override_with<T>(get: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = get(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(e) => warn!("{key}={raw:?} is not valid ({e}), using default {slot}"),
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[]));
        assert!(config.worker_count >= 2);
        assert_eq!(config.queue_capacity, 5000);
        assert_eq!(config.dequeue_timeout, Duration::from_secs(1));
        assert_eq!(config.restaurant(), GeoPoint::new(12.9719, 77.5946));
        assert_eq!(config.seconds_per_km, 120.0);
        assert_eq!(config.payment_success_rate, 0.98);
        assert_eq!(config.maps_api_key, None);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("KITCHEN_WORKERS", "3"),
            ("KITCHEN_QUEUE_CAPACITY", "lots"),
            ("KITCHEN_DEQUEUE_TIMEOUT_MS", "250"),
            ("KITCHEN_PAYMENT_SUCCESS_RATE", " 1.0 "),
            ("KITCHEN_MAPS_API_KEY", "abc"),
        ]));
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.queue_capacity, 5000);
        assert_eq!(config.dequeue_timeout, Duration::from_millis(250));
        assert_eq!(config.payment_success_rate, 1.0);
        assert_eq!(config.maps_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_zero_workers_is_bumped() {
        let config = PipelineConfig::from_lookup(lookup(&[("KITCHEN_WORKERS", "0")]));
        assert_eq!(config.worker_count, 1);
    }

    #[test]
    fn test_zero_store_buffer_is_bumped() {
        let config = PipelineConfig::from_lookup(lookup(&[("KITCHEN_STORE_BUFFER", "0")]));
        assert_eq!(config.store_buffer, 1);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "worker_count": 4, "dequeue_timeout": 50 }"#).unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.dequeue_timeout, Duration::from_millis(50));
        assert_eq!(config.store_buffer, 32);
    }
}

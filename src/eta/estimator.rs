use super::directions::DirectionsProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Lower bound of any estimate (5 minutes).
pub const MIN_ETA_SECONDS: u64 = 300;
/// Upper bound of any estimate (60 minutes).
pub const MAX_ETA_SECONDS: u64 = 3600;
/// Travel time per kilometre of straight-line distance.
pub const DEFAULT_SECONDS_PER_KM: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Delivery time estimates from a fixed origin.
#[derive(Debug, Clone, Copy)]
pub struct EtaEstimator {
    origin: GeoPoint,
    seconds_per_km: f64,
}

impl EtaEstimator {
    pub fn new(origin: GeoPoint, seconds_per_km: f64) -> Self {
        Self {
            origin,
            seconds_per_km,
        }
    }

    /// Local estimate: `clamp(300, 3600, round(km × seconds_per_km))`.
    pub fn estimate(&self, destination: GeoPoint) -> u64 {
        let km = haversine_km(self.origin, destination);
        let seconds = (km * self.seconds_per_km).round();
        let eta = clamp_eta_f64(seconds);
        debug!(km, eta, "Local ETA estimate");
        eta
    }

    /// Asks `directions` first and falls back to [`estimate`](Self::estimate)
    /// when it has no answer. Both paths are clamped to the same range.
    #[instrument(skip(self, directions))]
    pub async fn estimate_with_directions(
        &self,
        directions: &dyn DirectionsProvider,
        destination: GeoPoint,
    ) -> u64 {
        match directions.route_duration(self.origin, destination).await {
            Ok(seconds) => {
                debug!(seconds, "Directions service estimate");
                seconds.clamp(MIN_ETA_SECONDS, MAX_ETA_SECONDS)
            }
            Err(e) => {
                debug!(reason = %e, "No directions estimate, using distance");
                self.estimate(destination)
            }
        }
    }
}

fn clamp_eta_f64(seconds: f64) -> u64 {
    if seconds.is_nan() {
        return MAX_ETA_SECONDS;
    }
    seconds.clamp(MIN_ETA_SECONDS as f64, MAX_ETA_SECONDS as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eta::directions::{DirectionsError, MapsDirections};
    use async_trait::async_trait;

    const ORIGIN: GeoPoint = GeoPoint {
        lat: 12.9719,
        lng: 77.5946,
    };

    fn estimator() -> EtaEstimator {
        EtaEstimator::new(ORIGIN, DEFAULT_SECONDS_PER_KM)
    }

    /// Moves `km` due north of the origin.
    fn north_of_origin(km: f64) -> GeoPoint {
        GeoPoint::new(ORIGIN.lat + (km / EARTH_RADIUS_KM).to_degrees(), ORIGIN.lng)
    }

    #[test]
    fn test_haversine_known_distance() {
        assert!(haversine_km(ORIGIN, ORIGIN).abs() < 1e-9);
        let km = haversine_km(ORIGIN, north_of_origin(10.0));
        assert!((km - 10.0).abs() < 1e-6, "got {km}");
    }

    #[test]
    fn test_short_trip_is_clamped_to_floor() {
        assert_eq!(estimator().estimate(north_of_origin(1.0)), 300);
        assert_eq!(estimator().estimate(ORIGIN), 300);
    }

    #[test]
    fn test_long_trip_is_clamped_to_ceiling() {
        assert_eq!(estimator().estimate(north_of_origin(50.0)), 3600);
        assert_eq!(estimator().estimate(GeoPoint::new(-33.86, 151.2)), 3600);
    }

    #[test]
    fn test_mid_range_uses_speed_factor() {
        assert_eq!(estimator().estimate(north_of_origin(10.0)), 1200);
    }

    #[test]
    fn test_estimate_is_always_in_range() {
        let points = [
            GeoPoint::new(90.0, 180.0),
            GeoPoint::new(-90.0, -180.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(12.98, 77.60),
            GeoPoint::new(f64::MAX, f64::MIN),
        ];
        for p in points {
            let eta = estimator().estimate(p);
            assert!((MIN_ETA_SECONDS..=MAX_ETA_SECONDS).contains(&eta), "{p:?} -> {eta}");
        }
    }

    struct FixedRoute(u64);

    #[async_trait]
    impl DirectionsProvider for FixedRoute {
        async fn route_duration(&self, _: GeoPoint, _: GeoPoint) -> Result<u64, DirectionsError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_directions_result_is_preferred_and_clamped() {
        let dest = north_of_origin(10.0);
        assert_eq!(estimator().estimate_with_directions(&FixedRoute(900), dest).await, 900);
        assert_eq!(estimator().estimate_with_directions(&FixedRoute(10), dest).await, 300);
        assert_eq!(estimator().estimate_with_directions(&FixedRoute(99_999), dest).await, 3600);
    }

    #[tokio::test]
    async fn test_directions_failure_falls_back_to_distance() {
        let no_key = MapsDirections::new(None);
        let eta = estimator()
            .estimate_with_directions(&no_key, north_of_origin(10.0))
            .await;
        assert_eq!(eta, 1200);
    }
}

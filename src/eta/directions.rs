//! Optional third-party directions lookup.
//!
//! Every failure (no key, transport, unexpected payload) is an `Err`, and the
//! estimator treats all of them as "no estimate".

use super::estimator::GeoPoint;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DirectionsError {
    #[error("No directions API key configured")]
    MissingCredential,

    #[error("Directions service unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected directions response: {0}")]
    BadResponse(String),
}

/// Source of road travel times.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Driving duration in seconds from `origin` to `destination`.
    async fn route_duration(&self, origin: GeoPoint, destination: GeoPoint)
        -> Result<u64, DirectionsError>;
}

/// Fetches a JSON document over whatever HTTP client the host provides.
#[async_trait]
pub trait DirectionsTransport: Send + Sync + Debug {
    async fn get_json(&self, url: &str) -> Result<Value, DirectionsError>;
}

/// Google-style directions lookup.
///
/// Without a transport a keyed lookup reports [`DirectionsError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct MapsDirections {
    api_key: Option<String>,
    transport: Option<Arc<dyn DirectionsTransport>>,
}

impl MapsDirections {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            transport: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn DirectionsTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn request_url(&self, origin: GeoPoint, destination: GeoPoint) -> Result<String, DirectionsError> {
        let key = self.api_key.as_deref().ok_or(DirectionsError::MissingCredential)?;
        Ok(format!(
            "{DIRECTIONS_ENDPOINT}?origin={},{}&destination={},{}&key={key}",
            origin.lat, origin.lng, destination.lat, destination.lng
        ))
    }
}

#[async_trait]
impl DirectionsProvider for MapsDirections {
    async fn route_duration(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<u64, DirectionsError> {
        let url = self.request_url(origin, destination)?;
        let Some(transport) = &self.transport else {
            debug!(endpoint = DIRECTIONS_ENDPOINT, "Directions lookup skipped");
            return Err(DirectionsError::Unavailable("no HTTP transport configured".into()));
        };
        let body = transport.get_json(&url).await?;
        let seconds = parse_route_duration(&body)?;
        debug!(seconds, "Directions route duration");
        Ok(seconds)
    }
}

/// Reads `routes[0].legs[0].duration.value` from a directions response.
fn parse_route_duration(body: &Value) -> Result<u64, DirectionsError> {
    body.pointer("/routes/0/legs/0/duration/value")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            let status = body.get("status").and_then(Value::as_str).unwrap_or("missing duration");
            DirectionsError::BadResponse(status.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Canned {
        body: Value,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DirectionsTransport for Canned {
        async fn get_json(&self, url: &str) -> Result<Value, DirectionsError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn canned(body: Value) -> Arc<Canned> {
        Arc::new(Canned {
            body,
            urls: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_parse_route_duration() {
        let body = json!({
            "status": "OK",
            "routes": [{ "legs": [{ "duration": { "text": "14 mins", "value": 845 } }] }]
        });
        assert_eq!(parse_route_duration(&body), Ok(845));
    }

    #[test]
    fn test_parse_rejects_empty_routes() {
        let body = json!({ "status": "ZERO_RESULTS", "routes": [] });
        assert_eq!(
            parse_route_duration(&body),
            Err(DirectionsError::BadResponse("ZERO_RESULTS".into()))
        );
        assert!(parse_route_duration(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_missing_or_blank_key() {
        let origin = GeoPoint::new(12.9719, 77.5946);
        for provider in [MapsDirections::new(None), MapsDirections::new(Some("  ".into()))] {
            assert_eq!(
                provider.route_duration(origin, origin).await,
                Err(DirectionsError::MissingCredential)
            );
        }
    }

    #[tokio::test]
    async fn test_with_key_builds_url_but_reports_unavailable() {
        let provider = MapsDirections::new(Some("k3y".into()));
        let origin = GeoPoint::new(1.0, 2.0);
        let url = provider.request_url(origin, GeoPoint::new(3.0, 4.0)).unwrap();
        assert!(url.ends_with("?origin=1,2&destination=3,4&key=k3y"));
        assert!(matches!(
            provider.route_duration(origin, origin).await,
            Err(DirectionsError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_response_is_parsed() {
        let transport = canned(json!({
            "status": "OK",
            "routes": [{ "legs": [{ "duration": { "value": 1260 } }] }]
        }));
        let provider = MapsDirections::new(Some("k3y".into())).with_transport(transport.clone());
        let origin = GeoPoint::new(1.0, 2.0);

        assert_eq!(provider.route_duration(origin, GeoPoint::new(3.0, 4.0)).await, Ok(1260));
        let urls = transport.urls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with(DIRECTIONS_ENDPOINT));
    }

    #[tokio::test]
    async fn test_transport_error_status_is_bad_response() {
        let provider = MapsDirections::new(Some("k3y".into()))
            .with_transport(canned(json!({ "status": "REQUEST_DENIED" })));
        let origin = GeoPoint::new(1.0, 2.0);
        assert_eq!(
            provider.route_duration(origin, origin).await,
            Err(DirectionsError::BadResponse("REQUEST_DENIED".into()))
        );
    }

    #[tokio::test]
    async fn test_no_transport_call_without_key() {
        let transport = canned(json!({}));
        let provider = MapsDirections::new(None).with_transport(transport.clone());
        let origin = GeoPoint::new(1.0, 2.0);
        assert_eq!(
            provider.route_duration(origin, origin).await,
            Err(DirectionsError::MissingCredential)
        );
        assert!(transport.urls.lock().unwrap().is_empty());
    }
}

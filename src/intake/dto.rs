//! Request and response bodies for the intake surface. Field names are camelCase.

use crate::kitchen::ItemRequest;
use crate::model::{OrderId, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
    pub status: Status,
    pub total: f64,
    pub payment_token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub eta_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    #[serde(default)]
    pub payment_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayResponse {
    pub status: String,
}

impl PayResponse {
    pub fn paid() -> Self {
        Self {
            status: "PAID".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_place_order_request_tolerates_missing_fields() {
        let req: PlaceOrderRequest = serde_json::from_value(json!({ "customerName": "Asha" })).unwrap();
        assert!(req.items.is_empty());
        assert_eq!(req.customer_phone, None);

        let req: PlaceOrderRequest = serde_json::from_value(json!({
            "customerName": "Asha",
            "customerPhone": "555-0101",
            "items": [{ "menuItemId": 1, "quantity": 2 }]
        }))
        .unwrap();
        assert_eq!(req.items, vec![ItemRequest { menu_item_id: 1, quantity: 2 }]);
    }

    #[test]
    fn test_response_field_names() {
        let resp = PlaceOrderResponse {
            order_id: "ORD1-1".into(),
            status: Status::Received,
            total: 18.97,
            payment_token: "SIMULATED_PAYMENT_TOKEN_ORD1-1".into(),
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "orderId": "ORD1-1",
                "status": "RECEIVED",
                "total": 18.97,
                "paymentToken": "SIMULATED_PAYMENT_TOKEN_ORD1-1"
            })
        );
        assert_eq!(
            serde_json::to_value(TrackResponse { eta_seconds: 300 }).unwrap(),
            json!({ "etaSeconds": 300 })
        );
        assert_eq!(serde_json::to_value(PayResponse::paid()).unwrap(), json!({ "status": "PAID" }));
    }
}

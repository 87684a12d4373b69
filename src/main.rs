//! Demo: place one order, track it, pay for it and follow it to the door.

use kitchen_pipeline::config::PipelineConfig;
use kitchen_pipeline::intake::{PayRequest, PlaceOrderRequest, TrackRequest};
use kitchen_pipeline::kitchen::ItemRequest;
use kitchen_pipeline::lifecycle::{setup_tracing, KitchenSystem};
use kitchen_pipeline::notify::OrderEvent;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = PipelineConfig::from_env();
    info!(workers = config.worker_count, "Starting kitchen pipeline demo");
    let system = KitchenSystem::start(config).await.map_err(|e| e.to_string())?;

    let menu = system.intake.menu(None).await.map_err(|e| e.to_string())?;
    for item in &menu {
        info!(id = item.id, name = %item.name, price = item.price, category = %item.category, "Menu");
    }

    let request = PlaceOrderRequest {
        customer_name: "Asha".to_string(),
        customer_phone: Some("+91-98450-00000".to_string()),
        items: vec![
            ItemRequest { menu_item_id: 1, quantity: 2 },
            ItemRequest { menu_item_id: 5, quantity: 1 },
        ],
    };

    let span = tracing::info_span!("order_processing");
    let result = async {
        let placed = system.intake.place_order(request).await.map_err(|e| e.to_string())?;
        info!(order_id = %placed.order_id, total = placed.total, "Order placed");
        let mut events = system.intake.subscribe(&placed.order_id).await;

        let track = system
            .intake
            .track(&placed.order_id, TrackRequest { lat: Some(12.9352), lng: Some(77.6245) })
            .await
            .map_err(|e| e.to_string())?;
        info!(eta_seconds = track.eta_seconds, "Delivery location set");

        match system
            .intake
            .pay(&placed.order_id, PayRequest { payment_token: Some(placed.payment_token.clone()) })
            .await
        {
            Ok(paid) => info!(status = %paid.status, "Payment captured"),
            Err(e) => error!(error = %e, "Payment failed"),
        }

        while let Some(event) = events.recv().await {
            match &event {
                OrderEvent::Notification(message) => info!(%message, "Notification"),
                other => info!(event = other.name(), data = %other.data(), "Event"),
            }
        }
        info!(completion = ?events.completion().await, "Stream closed");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = &result {
        error!(error = %e, "Demo order failed");
    }

    system.shutdown().await.map_err(|e| e.to_string())?;
    info!("Demo completed");
    result
}

use super::{
    common::{map_service_error, success_response},
    locations::LocationResponse,
    products::ProductResponse,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    events::{StockFeed, StockUpdate},
    handlers::AppState,
};
use axum::{
    extract::State,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

pub const STOCK_UPDATE_EVENT: &str = "stockUpdate";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub quantity_change: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockUpdateResponse {
    pub product: ProductResponse,
    pub location: LocationResponse,
}

impl From<StockUpdate> for StockUpdateResponse {
    fn from(update: StockUpdate) -> Self {
        Self {
            product: update.product.into(),
            location: update.location.into(),
        }
    }
}

/// Move stock of a product into or out of a location
#[utoipa::path(
    post,
    path = "/api/v1/inventory/update-product",
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Ledger updated", body = StockUpdateResponse),
        (status = 404, description = "Product or Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = state
        .services
        .inventory
        .adjust_stock(
            payload.product_id,
            payload.location_id,
            payload.quantity_change,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(StockUpdateResponse::from(update)))
}

/// Server-sent events stream of `stockUpdate` messages.
pub fn stock_event_stream(feed: &StockFeed) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    stream::unfold(feed.subscribe(), |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(update) => {
                    match SseEvent::default()
                        .event(STOCK_UPDATE_EVENT)
                        .json_data(StockUpdateResponse::from(update))
                    {
                        Ok(event) => return Some((Ok(event), receiver)),
                        Err(e) => warn!(error = %e, "Failed to encode stock update"),
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Stock listener lagged; updates dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// Subscribe to real-time stock updates
#[utoipa::path(
    get,
    path = "/api/v1/inventory/stream",
    responses((status = 200, description = "text/event-stream of stockUpdate events")),
    tag = "inventory"
)]
pub async fn stream_stock_updates(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    Sse::new(stock_event_stream(&state.stock_feed)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{location, product};
    use crate::events::EventHandler;
    use chrono::Utc;
    use futures::StreamExt;
    use rust_decimal::Decimal;

    fn update() -> StockUpdate {
        let now = Utc::now();
        StockUpdate {
            product: product::Model {
                id: Uuid::new_v4(),
                name: "Stretch film".into(),
                sku: "SF-1".into(),
                description: None,
                min_stock_level: 10,
                max_stock_level: 100,
                total_stock: 20,
                amount: Decimal::ZERO,
                location_id: None,
                created_at: now,
                updated_at: now,
            },
            location: location::Model {
                id: Uuid::new_v4(),
                location_code: "A-01".into(),
                capacity: 100,
                current_load: 20,
                stock: 0,
                products: Default::default(),
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[tokio::test]
    async fn stream_yields_published_updates() {
        let feed = StockFeed::new(8);
        let stream = stock_event_stream(&feed);
        futures::pin_mut!(stream);

        feed.handle_event(crate::events::Event::StockUpdated(update()))
            .await
            .unwrap();

        assert!(stream.next().await.is_some());
    }
}

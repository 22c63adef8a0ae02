use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse API",
        version = "1.0.0",
        description = r#"
# Warehouse Receiving API

Back office for inbound goods.

## Features

- **Goods receipt notes**: record deliveries against purchase orders and reconcile each line into OK and rejected quantities
- **Dock and location assignment**: move received lines onto docks and storage locations
- **Stock ledger**: per-product totals and per-location allocations, with a live `stockUpdate` event stream
- **Master list**: only authorised item numbers may appear on a receipt

## Authentication

Every endpoint under `/api/v1` except `status` and `health` requires a bearer token issued by the identity provider:

```
Authorization: Bearer <your-jwt-token>
```

Replacing or extending the master list and deleting dock locations require the `admin` role.

## Error Handling

Errors share one body shape:

```json
{
  "error": "Bad Request",
  "message": "Validation error: Total OK and Rejected quantities cannot exceed Item Quantity",
  "requestId": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 10, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "grn", description = "Goods receipt notes and their line items"),
        (name = "locations", description = "Storage locations and item assignment"),
        (name = "dock-locations", description = "Receiving docks"),
        (name = "products", description = "Product catalogue"),
        (name = "inventory", description = "Stock ledger and live stock updates"),
        (name = "master-list", description = "Authorised item numbers")
    ),
    paths(
        crate::handlers::grn::create_grn,
        crate::handlers::grn::list_grns,
        crate::handlers::grn::get_grn,
        crate::handlers::grn::update_grn,
        crate::handlers::grn::delete_grn,
        crate::handlers::grn::update_grn_status,
        crate::handlers::grn::update_dock_location,
        crate::handlers::grn::update_item_status,
        crate::handlers::grn::update_item_location,
        crate::handlers::grn::update_item_quantities,
        crate::handlers::grn::delete_item,

        crate::handlers::locations::create_location,
        crate::handlers::locations::list_locations,
        crate::handlers::locations::assign_location,
        crate::handlers::locations::update_location_stock,
        crate::handlers::locations::update_location_capacity,
        crate::handlers::locations::set_location_product,

        crate::handlers::dock_locations::create_dock_location,
        crate::handlers::dock_locations::list_dock_locations,
        crate::handlers::dock_locations::delete_dock_location,

        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::update_product,
        crate::handlers::products::set_product_location,
        crate::handlers::products::delete_products,
        crate::handlers::products::count_by_sku,

        crate::handlers::inventory::adjust_stock,
        crate::handlers::inventory::stream_stock_updates,

        crate::handlers::master_list::replace_master_list,
        crate::handlers::master_list::add_master_list_item,
        crate::handlers::master_list::list_master_list,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            crate::entities::grn::ReceiptStatus,
            crate::entities::grn::GrnItem,
            crate::services::grn::CreateGrnInput,
            crate::services::grn::NewGrnItem,
            crate::handlers::grn::GrnResponse,
            crate::handlers::grn::GrnListResponse,

            crate::services::locations::LocationAssignment,
            crate::services::locations::AssignmentReport,
            crate::services::locations::AssignmentOutcome,
            crate::services::locations::AssignmentResult,
            crate::handlers::locations::LocationResponse,
            crate::handlers::dock_locations::DockLocationResponse,

            crate::handlers::products::ProductResponse,
            crate::handlers::inventory::StockUpdateResponse,
            crate::handlers::master_list::MasterListResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_receiving_endpoints() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Warehouse API"));
        assert!(json.contains("/api/v1/grn/{id}/item/{item_id}/status"));
        assert!(json.contains("/api/v1/locations/update-location"));
        assert!(json.contains("/api/v1/master-list"));
    }
}

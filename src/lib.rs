//! Warehouse API Library
//!
//! Receiving back office: goods receipt reconciliation, dock and location
//! assignment, the product/location stock ledger and the master list gate.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, ADMIN_ROLE};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub stock_feed: events::StockFeed,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            page,
            limit,
            total_pages: handlers::common::total_pages(total, limit),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn paginated_response_counts_pages() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 23, 1, 10);
        assert_eq!(page.total_pages, 3);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 3);
    }
}

// Enhanced API routes function
pub fn api_v1_routes() -> Router<AppState> {
    // Receiving: goods receipt notes and their items
    let grn = Router::new()
        .route(
            "/grn",
            post(handlers::grn::create_grn).get(handlers::grn::list_grns),
        )
        .route(
            "/grn/{id}",
            get(handlers::grn::get_grn)
                .put(handlers::grn::update_grn)
                .delete(handlers::grn::delete_grn),
        )
        .route("/grn/{id}/status", patch(handlers::grn::update_grn_status))
        .route(
            "/grn/{id}/location",
            patch(handlers::grn::update_dock_location),
        )
        .route(
            "/grn/{id}/item/{item}",
            patch(handlers::grn::update_item_quantities).delete(handlers::grn::delete_item),
        )
        .route(
            "/grn/{id}/item/{item}/status",
            patch(handlers::grn::update_item_status),
        )
        .route(
            "/grn/{id}/item/{item}/location",
            patch(handlers::grn::update_item_location),
        )
        .with_auth();

    // Storage locations and assignment
    let locations = Router::new()
        .route(
            "/locations",
            post(handlers::locations::create_location).get(handlers::locations::list_locations),
        )
        .route(
            "/locations/update-location",
            patch(handlers::locations::assign_location),
        )
        .route(
            "/locations/{id}/stock",
            patch(handlers::locations::update_location_stock),
        )
        .route(
            "/locations/{id}/capacity",
            patch(handlers::locations::update_location_capacity),
        )
        .route(
            "/locations/{id}/products",
            patch(handlers::locations::set_location_product),
        )
        .with_auth();

    let dock_locations = Router::new()
        .route(
            "/dock-locations",
            post(handlers::dock_locations::create_dock_location)
                .get(handlers::dock_locations::list_dock_locations),
        )
        .with_auth();

    let dock_locations_admin = Router::new()
        .route(
            "/dock-locations/{id}",
            delete(handlers::dock_locations::delete_dock_location),
        )
        .with_role(ADMIN_ROLE);

    // Product catalogue and stock ledger
    let products = Router::new()
        .route(
            "/products",
            post(handlers::products::create_product)
                .get(handlers::products::list_products)
                .delete(handlers::products::delete_products),
        )
        .route("/products/count", get(handlers::products::count_by_sku))
        .route("/products/{id}", put(handlers::products::update_product))
        .route(
            "/products/{id}/location",
            patch(handlers::products::set_product_location),
        )
        .with_auth();

    let inventory = Router::new()
        .route(
            "/inventory/update-product",
            post(handlers::inventory::adjust_stock),
        )
        .route(
            "/inventory/stream",
            get(handlers::inventory::stream_stock_updates),
        )
        .with_auth();

    // Master list: anyone signed in may read, only admins may change it
    let master_list_read = Router::new()
        .route(
            "/master-list",
            get(handlers::master_list::list_master_list),
        )
        .with_auth();

    let master_list_admin = Router::new()
        .route(
            "/master-list",
            put(handlers::master_list::replace_master_list),
        )
        .route(
            "/master-list/items",
            post(handlers::master_list::add_master_list_item),
        )
        .with_role(ADMIN_ROLE);

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(grn)
        .merge(locations)
        .merge(dock_locations)
        .merge(dock_locations_admin)
        .merge(products)
        .merge(inventory)
        .merge(master_list_read)
        .merge(master_list_admin)
}

async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "warehouse-api",
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Json(ApiResponse::success(status_data))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(e) => {
            ::tracing::warn!(error = %e, "Database ping failed");
            "unhealthy"
        }
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
            "stockListeners": state.stock_feed.listener_count(),
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Json(ApiResponse::success(health_data))
}

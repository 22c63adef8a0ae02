mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

async fn create_product(app: &TestApp, sku: &str, total_stock: i32) -> Value {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": format!("Product {sku}"),
                "sku": sku,
                "totalStock": total_stock,
                "amount": "12.50"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body
}

async fn create_location(app: &TestApp, code: &str) -> Value {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/locations",
            Some(json!({ "locationCode": code, "capacity": 500 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body
}

async fn adjust(app: &TestApp, product_id: &str, location_id: &str, change: i32) -> (StatusCode, Value) {
    app.json(
        Method::POST,
        "/api/v1/inventory/update-product",
        Some(json!({
            "productId": product_id,
            "locationId": location_id,
            "quantityChange": change
        })),
    )
    .await
}

#[tokio::test]
async fn product_defaults_and_sku_conflict() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-1", 0).await;
    assert_eq!(product["minStockLevel"], 10);
    assert_eq!(product["maxStockLevel"], 100);
    assert_eq!(product["totalStock"], 0);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Again", "sku": "SKU-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("SKU-1"));

    let (_, count) = app
        .json(Method::GET, "/api/v1/products/count?sku=SKU-1", None)
        .await;
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn adjust_stock_moves_product_total_and_location_allocation() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-1", 20).await;
    let location = create_location(&app, "LOC-1").await;
    let product_id = product["id"].as_str().unwrap();
    let location_id = location["id"].as_str().unwrap();

    let (status, first) = adjust(&app, product_id, location_id, 15).await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {first}");
    assert_eq!(first["product"]["totalStock"], 35);
    assert_eq!(first["location"]["currentLoad"], 15);
    assert_eq!(first["location"]["products"][0]["productId"], product_id);
    assert_eq!(first["location"]["products"][0]["quantity"], 15);

    let (status, second) = adjust(&app, product_id, location_id, -5).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["product"]["totalStock"], 30);
    assert_eq!(second["location"]["currentLoad"], 10);
    assert_eq!(second["location"]["products"][0]["quantity"], 10);
    assert_eq!(
        second["location"]["products"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn adjust_stock_with_unknown_references_changes_nothing() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-1", 5).await;
    let product_id = product["id"].as_str().unwrap();
    let missing = Uuid::new_v4().to_string();

    let (status, body) = adjust(&app, product_id, &missing, 3).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found: Product or Location not found");

    let (_, page) = app.json(Method::GET, "/api/v1/products", None).await;
    assert_eq!(page["items"][0]["totalStock"], 5);
}

#[tokio::test]
async fn stock_updates_reach_feed_listeners() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-1", 0).await;
    let location = create_location(&app, "LOC-1").await;
    let product_id = product["id"].as_str().unwrap();
    let location_id = location["id"].as_str().unwrap();

    let mut listener = app.state.stock_feed.subscribe();
    let (status, _) = adjust(&app, product_id, location_id, 7).await;
    assert_eq!(status, StatusCode::OK);

    let update = tokio::time::timeout(Duration::from_secs(2), listener.recv())
        .await
        .expect("stock update within timeout")
        .expect("feed open");
    assert_eq!(update.product.id.to_string(), product_id);
    assert_eq!(update.product.total_stock, 7);
    assert_eq!(update.location.current_load, 7);
}

#[tokio::test]
async fn product_location_must_exist() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-1", 0).await;
    let location = create_location(&app, "LOC-1").await;
    let product_id = product["id"].as_str().unwrap();

    let (status, _) = app
        .json(
            Method::PATCH,
            &format!("/api/v1/products/{product_id}/location"),
            Some(json!({ "locationId": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .json(
            Method::PATCH,
            &format!("/api/v1/products/{product_id}/location"),
            Some(json!({ "locationId": location["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["locationId"], location["id"]);
}

#[tokio::test]
async fn bulk_delete_reports_missing_products() {
    let app = TestApp::new().await;
    let first = create_product(&app, "SKU-1", 0).await;
    let second = create_product(&app, "SKU-2", 0).await;

    let (status, body) = app
        .json(
            Method::DELETE,
            "/api/v1/products",
            Some(json!({ "ids": [first["id"], second["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (status, _) = app
        .json(
            Method::DELETE,
            "/api/v1/products",
            Some(json!({ "ids": [first["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adjust_stock_rejects_allocation_overflow() {
    let app = TestApp::new().await;
    let product = create_product(&app, "SKU-1", 0).await;
    let location = create_location(&app, "LOC-1").await;
    let product_id = product["id"].as_str().unwrap();
    let location_id = location["id"].as_str().unwrap();

    let (status, _) = app
        .json(
            Method::PATCH,
            &format!("/api/v1/locations/{location_id}/products"),
            Some(json!({ "productId": product_id, "quantity": i32::MAX })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = adjust(&app, product_id, location_id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Quantity change is out of range"));

    let (_, page) = app.json(Method::GET, "/api/v1/products", None).await;
    assert_eq!(page["items"][0]["totalStock"], 0);
}

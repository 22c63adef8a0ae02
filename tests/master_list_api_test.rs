mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{response_json, TestApp, SEEDED_ITEM_NOS};

#[tokio::test]
async fn seeded_list_is_readable_by_any_signed_in_user() {
    let app = TestApp::new().await;

    let (status, body) = app.json(Method::GET, "/api/v1/master-list", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemNos"], json!(SEEDED_ITEM_NOS));
}

#[tokio::test]
async fn replace_trims_and_dedupes_item_numbers() {
    let app = TestApp::new().await;

    let response = app
        .request_as_admin(
            Method::PUT,
            "/api/v1/master-list",
            Some(json!({ "itemNos": [" X1 ", "X2", "X1", "", "X3"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Master list updated successfully");
    assert_eq!(body["count"], 3);

    let (_, listed) = app.json(Method::GET, "/api/v1/master-list", None).await;
    assert_eq!(listed["itemNos"], json!(["X1", "X2", "X3"]));

    // previously authorised numbers are gone
    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/grn",
            Some(json!({
                "poNumber": "PO1",
                "receivingNo": "R1",
                "items": [{ "itemNo": "A1", "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn changing_the_list_requires_admin() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::PUT,
            "/api/v1/master-list",
            Some(json!({ "itemNos": ["X1"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Access denied, admin only"));

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/master-list/items",
            Some(json!({ "itemNo": "X1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (_, listed) = app.json(Method::GET, "/api/v1/master-list", None).await;
    assert_eq!(listed["itemNos"], json!(SEEDED_ITEM_NOS));
}

#[tokio::test]
async fn add_item_rejects_blank_and_duplicate_numbers() {
    let app = TestApp::new().await;

    let response = app
        .request_as_admin(
            Method::POST,
            "/api/v1/master-list/items",
            Some(json!({ "itemNo": "  " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_admin(
            Method::POST,
            "/api/v1/master-list/items",
            Some(json!({ "itemNo": "C3" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["itemNo"], "C3");

    let response = app
        .request_as_admin(
            Method::POST,
            "/api/v1/master-list/items",
            Some(json!({ "itemNo": "C3" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

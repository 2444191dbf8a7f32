//! End-to-end flows through the HTTP router over the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_orders::domain::aggregates::StatusPolicy;
use storefront_orders::domain::value_objects::OrderId;
use storefront_orders::notify::Notifications;
use storefront_orders::storage::{MemoryStore, OrderStore};
use storefront_orders::{router, AppState};

fn app(policy: StatusPolicy) -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::default());
    store.seed_product("P1", "Argan Oil", Decimal::new(50, 0), true);
    store.seed_product("P2", "Clay Mask", Decimal::new(30, 0), true);
    store.seed_product("P3", "Rose Water", Decimal::new(20, 0), true);
    let state = AppState::new(store.clone(), store.clone(), Notifications::default(), "MAD", policy);
    (store, router(state))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.4")
        .header("user-agent", "integration-test")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn order_body(items: Value) -> Value {
    json!({
        "fullName": "Jane Doe",
        "phone": "123",
        "address": "1 Main St",
        "city": "Metropolis",
        "postalCode": "00000",
        "items": items,
    })
}

#[tokio::test]
async fn test_place_order_merges_lines_and_prices_server_side() {
    let (store, app) = app(StatusPolicy::Open);
    let (status, body) = call(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(json!([
            { "productId": "P1", "quantity": 2, "price": 1 },
            { "productId": "P1", "quantity": 1 }
        ]))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["totalAmount"], 150.0);
    assert!(body["orderNumber"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], 3);

    let id = OrderId::parse(body["id"].as_str().unwrap()).unwrap();
    let items = store.items_for_order(&id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);

    let (_, detail) = call(&app, "GET", &format!("/api/admin/orders/{id}"), None).await;
    assert_eq!(detail["order"]["status"], "ordered");
    assert_eq!(detail["order"]["ipAddress"], "198.51.100.4");
    assert_eq!(detail["order"]["userAgent"], "integration-test");
    assert_eq!(detail["order"]["sourceCountry"], "unknown");
}

#[tokio::test]
async fn test_inactive_product_rejects_whole_order() {
    let (store, app) = app(StatusPolicy::Open);
    let (_, hidden) = call(&app, "PUT", "/api/admin/products/P1/active", Some(json!({ "active": false }))).await;
    assert_eq!(hidden["isActive"], false);

    let (status, body) = call(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(json!([{ "productId": "P2", "quantity": 1 }, { "productId": "P1", "quantity": 1 }]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("P1"));
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.item_count(), 0);
}

#[tokio::test]
async fn test_unknown_products_are_listed() {
    let (_, app) = app(StatusPolicy::Open);
    let (status, body) = call(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(json!([{ "productId": "GONE-1", "quantity": 1 }, { "productId": "GONE-2", "quantity": 1 }]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Some items are no longer available: GONE-1, GONE-2");
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let (_, app) = app(StatusPolicy::Open);
    let (status, body) = call(&app, "POST", "/api/orders", Some(order_body(json!([{ "productId": "P1", "quantity": 0 }])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");
}

#[tokio::test]
async fn test_oversized_quantity_is_a_client_error() {
    let (store, app) = app(StatusPolicy::Open);
    let (status, body) = call(&app, "POST", "/api/orders", Some(order_body(json!([{ "productId": "P1", "quantity": 3_000_000_000u64 }])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Quantity too large for product: P1");
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.item_count(), 0);

    let (status, _) = call(&app, "POST", "/api/orders", Some(order_body(json!([{ "productId": "P1", "quantity": 2_147_483_647u64 }])))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_then_read_back_is_idempotent() {
    let (_, app) = app(StatusPolicy::Open);
    let (_, placed) = call(&app, "POST", "/api/orders", Some(order_body(json!([{ "productId": "P2", "quantity": 1 }])))).await;
    let id = placed["id"].as_str().unwrap().to_string();

    let (status, updated) = call(&app, "PUT", &format!("/api/admin/orders/{id}/status"), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "cancelled");

    let (_, first) = call(&app, "GET", &format!("/api/admin/orders/{id}"), None).await;
    let (_, second) = call(&app, "GET", &format!("/api/admin/orders/{id}"), None).await;
    assert_eq!(first["order"]["status"], "cancelled");
    assert_eq!(first, second);

    let (_, stats) = call(&app, "GET", "/api/admin/orders/stats", None).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["cancelled"], 1);
    assert_eq!(stats["totalRevenue"], 0.0);

    let (_, listed) = call(&app, "GET", "/api/admin/orders?status=cancelled", None).await;
    assert_eq!(listed["ok"], true);
    assert_eq!(listed["orders"].as_array().unwrap().len(), 1);
    assert_eq!(listed["orders"][0]["status"], "cancelled");
}

#[tokio::test]
async fn test_strict_policy_blocks_reopening() {
    let (_, app) = app(StatusPolicy::Strict);
    let (_, placed) = call(&app, "POST", "/api/orders", Some(order_body(json!([{ "productId": "P2", "quantity": 1 }])))).await;
    let uri = format!("/api/admin/orders/{}/status", placed["id"].as_str().unwrap());

    let (status, _) = call(&app, "PUT", &uri, Some(json!({ "status": "delivered" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "PUT", &uri, Some(json!({ "status": "ordered" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot move order from delivered to ordered");

    let (status, _) = call(&app, "PUT", &uri, Some(json!({ "status": "shipped" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_removes_order_and_items() {
    let (store, app) = app(StatusPolicy::Open);
    let (_, placed) = call(
        &app,
        "POST",
        "/api/orders",
        Some(order_body(json!([
            { "productId": "P1", "quantity": 1 },
            { "productId": "P2", "quantity": 2 },
            { "productId": "P3", "quantity": 3 }
        ]))),
    )
    .await;
    assert_eq!(placed["totalAmount"], 170.0);
    let id = placed["id"].as_str().unwrap().to_string();
    assert_eq!(store.item_count(), 3);

    let (status, body) = call(&app, "DELETE", &format!("/api/admin/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedItems"], 3);

    let (status, _) = call(&app, "GET", &format!("/api/admin/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(store.item_count(), 0);
    assert_eq!(store.order_count(), 0);

    let (status, _) = call(&app, "DELETE", &format!("/api/admin/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! JSON API: storefront checkout and catalog, plus the admin endpoints.

mod admin;
mod error;
mod orders;
mod products;

pub use error::{ApiError, ApiJson};
pub use orders::{provenance, OrderCreated};

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use crate::admin::{CatalogAdmin, OrderAdmin};
use crate::checkout::Checkout;
use crate::domain::aggregates::StatusPolicy;
use crate::notify::Notifications;
use crate::storage::{CatalogStore, OrderStore};

#[derive(Clone)]
pub struct AppState {
    pub checkout: Checkout,
    pub orders: OrderAdmin,
    pub catalog: CatalogAdmin,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        notifications: Notifications,
        currency: impl Into<String>,
        policy: StatusPolicy,
    ) -> Self {
        Self {
            checkout: Checkout::new(catalog.clone(), orders.clone(), notifications.clone(), currency),
            orders: OrderAdmin::new(orders, notifications.clone(), policy),
            catalog: CatalogAdmin::new(catalog, notifications),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "storefront-orders"})) }))
        .route("/api/orders", post(orders::create_order))
        .route("/api/products", get(products::list_active))
        .route("/api/products/:id", get(products::get_active))
        .route("/api/admin/orders", get(admin::list_orders))
        .route("/api/admin/orders/stats", get(admin::order_stats))
        .route("/api/admin/orders/sweep", post(admin::sweep))
        .route("/api/admin/orders/:id", get(admin::get_order).delete(admin::delete_order))
        .route("/api/admin/orders/:id/status", put(admin::update_status))
        .route("/api/admin/products", get(products::list).post(products::create))
        .route("/api/admin/products/:id", put(products::update).delete(products::delete))
        .route("/api/admin/products/:id/active", put(products::set_active))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .with_state(state)
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiJson, AppState};
use crate::admin::{AdminError, ProductInput};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;

pub async fn list_active(State(s): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(s.catalog.list_active_products().await?))
}

/// Inactive products are hidden from the storefront.
pub async fn get_active(State(s): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>, ApiError> {
    let product = s.catalog.get_product(&id).await?;
    if !product.is_active {
        return Err(AdminError::ProductNotFound(id).into());
    }
    Ok(Json(product))
}

pub async fn list(State(s): State<AppState>) -> Result<Json<Value>, ApiError> {
    let products = s.catalog.list_products().await?;
    Ok(Json(json!({ "ok": true, "products": products })))
}

pub async fn create(State(s): State<AppState>, ApiJson(input): ApiJson<ProductInput>) -> Result<(StatusCode, Json<Product>), ApiError> {
    Ok((StatusCode::CREATED, Json(s.catalog.create_product(input).await?)))
}

pub async fn update(State(s): State<AppState>, Path(id): Path<ProductId>, ApiJson(input): ApiJson<ProductInput>) -> Result<Json<Product>, ApiError> {
    Ok(Json(s.catalog.update_product(&id, input).await?))
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest { pub active: bool }

pub async fn set_active(State(s): State<AppState>, Path(id): Path<ProductId>, ApiJson(r): ApiJson<ActiveRequest>) -> Result<Json<Product>, ApiError> {
    Ok(Json(s.catalog.set_product_active(&id, r.active).await?))
}

pub async fn delete(State(s): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Value>, ApiError> {
    s.catalog.delete_product(&id).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}

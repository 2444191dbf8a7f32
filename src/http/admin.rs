use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiJson, AppState};
use crate::admin::{self, AdminError, Dashboard, OrderDetail, OrderStats};
use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::value_objects::OrderId;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery { pub status: Option<String> }

/// `all` or an empty value means no filter.
fn status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>, AdminError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => Ok(Some(s.parse::<OrderStatus>()?)),
    }
}

pub async fn list_orders(State(s): State<AppState>, Query(q): Query<ListQuery>) -> Result<Json<Value>, ApiError> {
    let status = status_filter(q.status.as_deref())?;
    let orders = s.orders.list_orders(status).await?;
    Ok(Json(json!({ "ok": true, "orders": orders })))
}

pub async fn order_stats(State(s): State<AppState>) -> Result<Json<OrderStats>, ApiError> { Ok(Json(s.orders.order_stats().await?)) }

pub async fn get_order(State(s): State<AppState>, Path(id): Path<OrderId>) -> Result<Json<OrderDetail>, ApiError> {
    Ok(Json(s.orders.get_order(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest { pub status: String }

pub async fn update_status(State(s): State<AppState>, Path(id): Path<OrderId>, ApiJson(r): ApiJson<StatusRequest>) -> Result<Json<Order>, ApiError> {
    let status = r.status.parse::<OrderStatus>().map_err(AdminError::from)?;
    Ok(Json(s.orders.update_order_status(&id, status).await?))
}

pub async fn delete_order(State(s): State<AppState>, Path(id): Path<OrderId>) -> Result<Json<Value>, ApiError> {
    let deleted = s.orders.delete_order(&id).await?;
    Ok(Json(json!({ "ok": true, "id": id, "deletedItems": deleted })))
}

pub async fn sweep(State(s): State<AppState>) -> Result<Json<Value>, ApiError> {
    let cancelled = s.orders.sweep_incomplete_orders().await?;
    Ok(Json(json!({ "ok": true, "cancelled": cancelled })))
}

pub async fn dashboard(State(s): State<AppState>) -> Result<Json<Dashboard>, ApiError> { Ok(Json(admin::dashboard(&s.orders, &s.catalog).await?)) }

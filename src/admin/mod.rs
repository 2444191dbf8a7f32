//! Back-office order and product management.

pub mod catalog;
pub mod stats;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub use catalog::{CatalogAdmin, ProductInput};
pub use stats::{OrderStats, STATS_SCAN_LIMIT};

use crate::domain::aggregates::{Order, OrderError, OrderItem, OrderStatus, Product, ProductError, StatusPolicy};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{OrderId, OrderItemId, ProductId};
use crate::notify::Notifications;
use crate::storage::{OrderStore, StorageError};

/// Page size for admin listings.
pub const LIST_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("{0}")]
    InvalidProduct(#[from] ProductError),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Cannot move order from {from} to {to}")]
    TransitionRejected { from: OrderStatus, to: OrderStatus },

    #[error("Failed to delete {} item(s) of order {order_id}", .failed.len())]
    PartialDelete { order_id: OrderId, failed: Vec<(OrderItemId, String)> },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<OrderError> for AdminError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::UnknownStatus(s) => Self::InvalidStatus(s),
            OrderError::TransitionRejected { from, to } => Self::TransitionRejected { from, to },
        }
    }
}

/// An order header with its items.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    pub stats: OrderStats,
    pub products: Vec<Product>,
}

#[derive(Clone)]
pub struct OrderAdmin {
    orders: Arc<dyn OrderStore>,
    notifications: Notifications,
    policy: StatusPolicy,
}

impl OrderAdmin {
    pub fn new(orders: Arc<dyn OrderStore>, notifications: Notifications, policy: StatusPolicy) -> Self {
        Self { orders, notifications, policy }
    }

    /// Newest first; `None` lists every status.
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, AdminError> {
        Ok(self.orders.list_orders(status, LIST_LIMIT).await?)
    }

    pub async fn get_order(&self, id: &OrderId) -> Result<OrderDetail, AdminError> {
        let order = self.find(id).await?;
        let items = self.orders.items_for_order(id).await?;
        Ok(OrderDetail { order, items })
    }

    #[instrument(skip(self), fields(policy = ?self.policy))]
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, AdminError> {
        let mut order = self.find(id).await?;
        let event = order.transition(status, self.policy)?;
        if !self.orders.save_status(&order).await? {
            return Err(AdminError::OrderNotFound(id.clone()));
        }
        info!(order_id = %id, status = %status, "order status updated");
        self.notifications.publish(&DomainEvent::Order(event)).await;
        Ok(order)
    }

    /// Removes every item, then the header. If any item deletion fails the
    /// header is kept and the call can be retried.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<usize, AdminError> {
        self.find(id).await?;
        let items = self.orders.items_for_order(id).await?;
        let results = join_all(items.iter().map(|item| self.orders.delete_item(&item.id))).await;

        let failed: Vec<(OrderItemId, String)> = items
            .iter()
            .zip(results)
            .filter_map(|(item, r)| r.err().map(|e| (item.id.clone(), e.to_string())))
            .collect();
        if !failed.is_empty() {
            warn!(order_id = %id, failed = failed.len(), total = items.len(), "order items not deleted, keeping header");
            return Err(AdminError::PartialDelete { order_id: id.clone(), failed });
        }

        if !self.orders.delete_order(id).await? {
            return Err(AdminError::OrderNotFound(id.clone()));
        }
        info!(order_id = %id, items = items.len(), "order deleted");
        self.notifications.publish(&DomainEvent::Order(OrderEvent::Deleted { order_id: id.clone() })).await;
        Ok(items.len())
    }

    pub async fn order_stats(&self) -> Result<OrderStats, AdminError> {
        let orders = self.orders.list_orders(None, STATS_SCAN_LIMIT).await?;
        Ok(OrderStats::tally(&orders, Utc::now().date_naive()))
    }

    /// Cancels orders that were left with a header but no items.
    #[instrument(skip(self))]
    pub async fn sweep_incomplete_orders(&self) -> Result<Vec<OrderId>, AdminError> {
        let mut swept = Vec::new();
        for mut order in self.orders.orders_without_items(STATS_SCAN_LIMIT).await? {
            if order.status == OrderStatus::Cancelled { continue; }
            order.transition(OrderStatus::Cancelled, StatusPolicy::Open)?;
            if self.orders.save_status(&order).await? {
                self.notifications.publish(&DomainEvent::Order(OrderEvent::Voided { order_id: order.id.clone() })).await;
                swept.push(order.id);
            }
        }
        if !swept.is_empty() { warn!(count = swept.len(), "cancelled orders without items"); }
        Ok(swept)
    }

    async fn find(&self, id: &OrderId) -> Result<Order, AdminError> {
        self.orders.get_order(id).await?.ok_or_else(|| AdminError::OrderNotFound(id.clone()))
    }
}

/// Order stats and the product list, fetched concurrently.
pub async fn dashboard(orders: &OrderAdmin, catalog: &CatalogAdmin) -> Result<Dashboard, AdminError> {
    let (stats, products) = tokio::join!(orders.order_stats(), catalog.list_products());
    Ok(Dashboard { stats: stats?, products: products? })
}

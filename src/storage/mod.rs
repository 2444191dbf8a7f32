//! Persistence for products, orders and order items.
//!
//! Stores sit behind traits so the HTTP layer and services can run against
//! PostgreSQL in production and [`MemoryStore`] in tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::{Order, OrderItem, OrderStatus, ProductDraft, ProductRecord};
use crate::domain::value_objects::{OrderId, OrderItemId, ProductId};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt {entity} {id}: {reason}")]
    Corrupt { entity: &'static str, id: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Records for exactly the given ids, in no particular order. Unknown ids are absent.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductRecord>>;
    /// Newest first. With `active_only`, hidden products are filtered before the limit applies.
    async fn list_products(&self, active_only: bool, limit: usize) -> Result<Vec<ProductRecord>>;
    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductRecord>>;
    async fn insert_product(&self, draft: &ProductDraft) -> Result<ProductRecord>;
    async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Option<ProductRecord>>;
    async fn set_product_active(&self, id: &ProductId, active: bool) -> Result<Option<ProductRecord>>;
    async fn delete_product(&self, id: &ProductId) -> Result<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the header and all items atomically.
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()>;
    /// Newest first, optionally restricted to one status.
    async fn list_orders(&self, status: Option<OrderStatus>, limit: usize) -> Result<Vec<Order>>;
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>>;
    async fn items_for_order(&self, id: &OrderId) -> Result<Vec<OrderItem>>;
    /// Persists `status` and `updated_at`. `false` when the order is gone.
    async fn save_status(&self, order: &Order) -> Result<bool>;
    async fn delete_item(&self, id: &OrderItemId) -> Result<bool>;
    /// Deletes the header only; items must already be gone.
    async fn delete_order(&self, id: &OrderId) -> Result<bool>;
    /// Orders that have a header but no items, newest first.
    async fn orders_without_items(&self, limit: usize) -> Result<Vec<Order>>;
}

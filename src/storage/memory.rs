use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::{CatalogStore, OrderStore, Result};
use crate::domain::aggregates::{Order, OrderItem, OrderStatus, ProductDraft, ProductRecord};
use crate::domain::value_objects::{OrderId, OrderItemId, ProductId};

/// In-process store used by tests and local runs without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, ProductRecord>,
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderItemId, OrderItem>,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Inserts a product with a fixed id.
    pub fn seed_product(&self, id: &str, title: &str, price: Decimal, active: bool) -> ProductRecord {
        self.seed_record(ProductRecord {
            id: ProductId::parse(id).unwrap_or_else(ProductId::generate),
            title: Some(title.to_string()),
            price: Some(price),
            description: None,
            image_file_ids: Vec::new(),
            is_active: Some(active),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    /// Inserts a record as-is, including ones that would fail boundary checks.
    pub fn seed_record(&self, record: ProductRecord) -> ProductRecord {
        self.state().products.insert(record.id.clone(), record.clone());
        record
    }

    pub fn order_count(&self) -> usize { self.state().orders.len() }
    pub fn item_count(&self) -> usize { self.state().items.len() }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, String)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductRecord>> {
        let state = self.state();
        Ok(ids.iter().filter_map(|id| state.products.get(id).cloned()).collect())
    }

    async fn list_products(&self, active_only: bool, limit: usize) -> Result<Vec<ProductRecord>> {
        let mut rows: Vec<ProductRecord> = self.state().products.values().filter(|p| !active_only || p.is_active()).cloned().collect();
        newest_first(&mut rows, |p| (p.created_at, p.id.to_string()));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductRecord>> { Ok(self.state().products.get(id).cloned()) }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<ProductRecord> {
        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::generate(),
            title: Some(draft.title.clone()),
            price: Some(draft.price),
            description: draft.description.clone(),
            image_file_ids: draft.image_file_ids.clone(),
            is_active: Some(true),
            created_at: now,
            updated_at: now,
        };
        Ok(self.seed_record(record))
    }

    async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Option<ProductRecord>> {
        let mut state = self.state();
        Ok(state.products.get_mut(id).map(|p| {
            p.title = Some(draft.title.clone());
            p.price = Some(draft.price);
            p.description = draft.description.clone();
            p.image_file_ids = draft.image_file_ids.clone();
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn set_product_active(&self, id: &ProductId, active: bool) -> Result<Option<ProductRecord>> {
        let mut state = self.state();
        Ok(state.products.get_mut(id).map(|p| {
            p.is_active = Some(active);
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> { Ok(self.state().products.remove(id).is_some()) }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()> {
        let mut state = self.state();
        state.orders.insert(order.id.clone(), order.clone());
        for item in items {
            state.items.insert(item.id.clone(), item.clone());
        }
        Ok(())
    }

    async fn list_orders(&self, status: Option<OrderStatus>, limit: usize) -> Result<Vec<Order>> {
        let mut rows: Vec<Order> = self.state().orders.values().filter(|o| status.map_or(true, |s| o.status == s)).cloned().collect();
        newest_first(&mut rows, |o| (o.created_at, o.id.to_string()));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>> { Ok(self.state().orders.get(id).cloned()) }

    async fn items_for_order(&self, id: &OrderId) -> Result<Vec<OrderItem>> {
        let mut items: Vec<OrderItem> = self.state().items.values().filter(|i| &i.order_id == id).cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn save_status(&self, order: &Order) -> Result<bool> {
        let mut state = self.state();
        Ok(state.orders.get_mut(&order.id).map(|o| {
            o.status = order.status;
            o.updated_at = order.updated_at;
        }).is_some())
    }

    async fn delete_item(&self, id: &OrderItemId) -> Result<bool> { Ok(self.state().items.remove(id).is_some()) }

    async fn delete_order(&self, id: &OrderId) -> Result<bool> { Ok(self.state().orders.remove(id).is_some()) }

    async fn orders_without_items(&self, limit: usize) -> Result<Vec<Order>> {
        let state = self.state();
        let mut rows: Vec<Order> = state.orders.values().filter(|o| !state.items.values().any(|i| i.order_id == o.id)).cloned().collect();
        drop(state);
        newest_first(&mut rows, |o| (o.created_at, o.id.to_string()));
        rows.truncate(limit);
        Ok(rows)
    }
}

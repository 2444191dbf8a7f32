use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{CatalogStore, OrderStore, Result, StorageError};
use crate::domain::aggregates::{CustomerInfo, Order, OrderItem, OrderStatus, ProductDraft, ProductRecord, Provenance};
use crate::domain::value_objects::{OrderId, OrderItemId, OrderNumber, ProductId};

const PRODUCT_COLUMNS: &str = "id, title, price, description, image_file_ids, is_active, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, order_number, full_name, phone, email, address, city, postal_code, notes, total_amount, status, ip_address, user_agent, source_country, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    full_name: String,
    phone: String,
    email: Option<String>,
    address: String,
    city: String,
    postal_code: String,
    notes: Option<String>,
    total_amount: Decimal,
    status: String,
    ip_address: String,
    user_agent: String,
    source_country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StorageError;
    fn try_from(r: OrderRow) -> Result<Self> {
        let corrupt = |reason: String| StorageError::Corrupt { entity: "order", id: r.id.clone(), reason };
        let status = r.status.parse::<OrderStatus>().map_err(|e| corrupt(e.to_string()))?;
        let id = OrderId::parse(&r.id).ok_or_else(|| corrupt("empty id".into()))?;
        let order_number = OrderNumber::parse(&r.order_number).ok_or_else(|| corrupt("empty order number".into()))?;
        Ok(Order {
            id,
            order_number,
            customer: CustomerInfo {
                full_name: r.full_name,
                phone: r.phone,
                email: r.email,
                address: r.address,
                city: r.city,
                postal_code: r.postal_code,
                notes: r.notes,
            },
            total_amount: r.total_amount,
            status,
            provenance: Provenance { ip_address: r.ip_address, user_agent: r.user_agent, source_country: r.source_country },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    title: String,
    price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = StorageError;
    fn try_from(r: OrderItemRow) -> Result<Self> {
        let corrupt = |reason: &str| StorageError::Corrupt { entity: "order item", id: r.id.clone(), reason: reason.to_string() };
        Ok(OrderItem {
            id: OrderItemId::parse(&r.id).ok_or_else(|| corrupt("empty id"))?,
            order_id: OrderId::parse(&r.order_id).ok_or_else(|| corrupt("empty order id"))?,
            product_id: ProductId::parse(&r.product_id).ok_or_else(|| corrupt("empty product id"))?,
            quantity: u32::try_from(r.quantity).map_err(|_| corrupt("negative quantity"))?,
            title: r.title,
            price: r.price,
        })
    }
}

fn orders(rows: Vec<OrderRow>) -> Result<Vec<Order>> { rows.into_iter().map(Order::try_from).collect() }

#[async_trait]
impl CatalogStore for PgStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<ProductRecord>> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();
        let rows = sqlx::query_as::<_, ProductRecord>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_products(&self, active_only: bool, limit: usize) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE NOT $1 OR is_active IS NOT FALSE ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(active_only)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRecord>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<ProductRecord> {
        let row = sqlx::query_as::<_, ProductRecord>(&format!(
            "INSERT INTO products (id, title, price, description, image_file_ids, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, TRUE, NOW(), NOW()) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(ProductId::generate().as_str())
        .bind(&draft.title)
        .bind(draft.price)
        .bind(&draft.description)
        .bind(draft.image_file_ids.as_slice())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRecord>(&format!(
            "UPDATE products SET title = $2, price = $3, description = $4, image_file_ids = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(&draft.title)
        .bind(draft.price)
        .bind(&draft.description)
        .bind(draft.image_file_ids.as_slice())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_product_active(&self, id: &ProductId, active: bool) -> Result<Option<ProductRecord>> {
        let row = sqlx::query_as::<_, ProductRecord>(&format!(
            "UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(order.id.as_str())
        .bind(order.order_number.as_str())
        .bind(&order.customer.full_name)
        .bind(&order.customer.phone)
        .bind(&order.customer.email)
        .bind(&order.customer.address)
        .bind(&order.customer.city)
        .bind(&order.customer.postal_code)
        .bind(&order.customer.notes)
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(&order.provenance.ip_address)
        .bind(&order.provenance.user_agent)
        .bind(&order.provenance.source_country)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            let quantity = i32::try_from(item.quantity).map_err(|_| StorageError::Corrupt {
                entity: "order item",
                id: item.id.to_string(),
                reason: format!("quantity {} out of range", item.quantity),
            })?;
            sqlx::query("INSERT INTO order_items (id, order_id, product_id, title, price, quantity) VALUES ($1, $2, $3, $4, $5, $6)")
                .bind(item.id.as_str())
                .bind(item.order_id.as_str())
                .bind(item.product_id.as_str())
                .bind(&item.title)
                .bind(item.price)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_orders(&self, status: Option<OrderStatus>, limit: usize) -> Result<Vec<Order>> {
        let rows = match status {
            Some(s) => sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 ORDER BY created_at DESC, id DESC LIMIT $2"))
                .bind(s.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?,
            None => sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1"))
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?,
        };
        orders(rows)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn items_for_order(&self, id: &OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>("SELECT id, order_id, product_id, title, price, quantity FROM order_items WHERE order_id = $1 ORDER BY id")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(OrderItem::try_from).collect()
    }

    async fn save_status(&self, order: &Order) -> Result<bool> {
        let done = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order.id.as_str())
            .bind(order.status.as_str())
            .bind(order.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_item(&self, id: &OrderItemId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM order_items WHERE id = $1").bind(id.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_order(&self, id: &OrderId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn orders_without_items(&self, limit: usize) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE NOT EXISTS (SELECT 1 FROM order_items i WHERE i.order_id = o.id) \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        orders(rows)
    }
}

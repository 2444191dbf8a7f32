//! Checkout: validate the submission, re-price it from the catalog, persist
//! the order, then notify in the background.

pub mod pricing;
pub mod validation;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, Instrument};

pub use pricing::{PricedItem, PricedOrder};
pub use validation::{RawOrderForm, SubmittedItem, ValidatedOrder};

use crate::domain::aggregates::{CustomerInfo, Order, OrderItem, OrderStatus, Provenance};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{OrderId, OrderItemId, OrderNumber, ProductId};
use crate::notify::{Notifications, OrderSummary};
use crate::storage::{CatalogStore, OrderStore, StorageError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Some items are no longer available: {}", join_ids(.0))]
    ProductsUnavailable(Vec<ProductId>),

    #[error("Product unavailable: {0}")]
    ProductInactive(String),

    #[error("Invalid price for product: {0}")]
    InvalidPrice(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CheckoutError {
    /// Whether the customer can fix this by editing the form or cart.
    pub fn is_client_error(&self) -> bool { !matches!(self, Self::Storage(_)) }
}

fn join_ids(ids: &[ProductId]) -> String { ids.iter().map(ProductId::as_str).collect::<Vec<_>>().join(", ") }

/// Result of a successful checkout.
#[derive(Clone, Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<PricedItem>,
}

#[derive(Clone)]
pub struct Checkout {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    notifications: Notifications,
    currency: String,
}

impl Checkout {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>, notifications: Notifications, currency: impl Into<String>) -> Self {
        Self { catalog, orders, notifications, currency: currency.into() }
    }

    #[instrument(skip_all, fields(ip = %provenance.ip_address))]
    pub async fn place_order(&self, form: &RawOrderForm, provenance: Provenance) -> Result<PlacedOrder, CheckoutError> {
        let validated = validation::validate(form)?;
        let priced = pricing::reconcile(self.catalog.as_ref(), &validated.items).await?;
        let (order, _) = create_order(self.orders.as_ref(), validated.customer, &priced, provenance).await?;
        info!(order_id = %order.id, order_number = %order.order_number, total = %order.total_amount, items = priced.items.len(), "order placed");

        if !self.notifications.is_empty() {
            let summary = OrderSummary::build(&order, &priced.items, &self.currency);
            let event = DomainEvent::Order(OrderEvent::Placed {
                order_id: order.id.clone(),
                order_number: order.order_number.clone(),
                total: order.total_amount,
            });
            let notifications = self.notifications.clone();
            tokio::spawn(
                async move {
                    notifications.order_placed(&summary).await;
                    notifications.publish(&event).await;
                }
                .in_current_span(),
            );
        }

        Ok(PlacedOrder { order, items: priced.items })
    }
}

/// Writes the order header (status `ordered`) and one item per priced line.
/// The store commits both or neither.
pub async fn create_order(store: &dyn OrderStore, customer: CustomerInfo, priced: &PricedOrder, provenance: Provenance) -> Result<(Order, Vec<OrderItem>), StorageError> {
    let now = Utc::now();
    let order = Order {
        id: OrderId::generate(),
        order_number: OrderNumber::generate(now),
        customer,
        total_amount: priced.total,
        status: OrderStatus::Ordered,
        provenance,
        created_at: now,
        updated_at: now,
    };
    let items: Vec<OrderItem> = priced
        .items
        .iter()
        .map(|p| OrderItem {
            id: OrderItemId::generate(),
            order_id: order.id.clone(),
            product_id: p.product_id.clone(),
            title: p.title.clone(),
            price: p.price,
            quantity: p.quantity,
        })
        .collect();
    store.insert_order(&order, &items).await?;
    Ok((order, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notifier, NotifyError};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Sink that stalls before reporting each order number on a channel.
    struct SlowSink {
        delay: Duration,
        tx: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl Notifier for SlowSink {
        fn name(&self) -> &'static str { "slow" }

        async fn order_placed(&self, summary: &OrderSummary) -> Result<(), NotifyError> {
            tokio::time::sleep(self.delay).await;
            let _ = self.tx.send(summary.order_id.clone());
            Ok(())
        }
    }

    async fn seeded(active: bool) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.seed_product("P1", "Argan Oil", Decimal::new(50, 0), active);
        store
    }

    fn checkout(store: &Arc<MemoryStore>) -> Checkout {
        Checkout::new(store.clone(), store.clone(), Notifications::default(), "MAD")
    }

    fn form(items: serde_json::Value) -> RawOrderForm {
        RawOrderForm::from_json(&json!({
            "fullName": "Jane Doe", "phone": "123", "address": "1 Main St",
            "city": "Metropolis", "postalCode": "00000", "items": items,
        }))
    }

    #[tokio::test]
    async fn test_duplicate_lines_become_one_item() {
        let store = seeded(true).await;
        let placed = checkout(&store)
            .place_order(&form(json!([{ "productId": "P1", "quantity": 2 }, { "productId": "P1", "quantity": 1 }])), Provenance::default())
            .await
            .unwrap();
        assert_eq!(placed.order.total_amount, Decimal::new(150, 0));
        assert_eq!(placed.order.status, OrderStatus::Ordered);

        let items = store.items_for_order(&placed.order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].title, "Argan Oil");
        assert_eq!(items.iter().map(OrderItem::line_total).sum::<Decimal>(), placed.order.total_amount);
    }

    #[tokio::test]
    async fn test_client_prices_are_ignored() {
        let store = seeded(true).await;
        let placed = checkout(&store)
            .place_order(&form(json!([{ "productId": "P1", "quantity": 1, "price": 0.01 }])), Provenance::default())
            .await
            .unwrap();
        assert_eq!(placed.order.total_amount, Decimal::new(50, 0));
    }

    #[tokio::test]
    async fn test_slow_sink_does_not_delay_checkout() {
        let store = seeded(true).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = SlowSink { delay: Duration::from_millis(300), tx };
        let checkout = Checkout::new(store.clone(), store.clone(), Notifications::new(vec![Arc::new(sink)]), "MAD");

        let placed = tokio::time::timeout(
            Duration::from_millis(200),
            checkout.place_order(&form(json!([{ "productId": "P1", "quantity": 1 }])), Provenance::default()),
        )
        .await
        .expect("checkout waited on the notification sink")
        .unwrap();
        assert_eq!(store.order_count(), 1);

        let notified = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(notified, Some(placed.order.order_number.to_string()));
    }

    #[tokio::test]
    async fn test_rejections_write_nothing() {
        let store = seeded(false).await;
        let err = checkout(&store).place_order(&form(json!([{ "productId": "P1", "quantity": 1 }])), Provenance::default()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductInactive(ref label) if label.contains("P1")));
        assert!(err.is_client_error());

        let err = checkout(&store).place_order(&form(json!([{ "productId": "nope", "quantity": 1 }])), Provenance::default()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductsUnavailable(_)));

        assert_eq!(store.order_count(), 0);
        assert_eq!(store.item_count(), 0);
    }
}

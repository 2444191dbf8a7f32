//! Best-effort side effects after an order is written.
//!
//! Failures are logged and swallowed; an order is never undone because a
//! notification channel was down.

mod nats;
mod webhook;

pub use nats::NatsNotifier;
pub use webhook::{WebhookConfig, WebhookNotifier};

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::checkout::PricedItem;
use crate::domain::aggregates::Order;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::Money;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("NATS publish failed: {0}")]
    Nats(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Human-readable order summary sent to the shop owner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub order_date: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub product_name: String,
    pub quantity: String,
    pub price: String,
    pub total: String,
    pub notes: String,
}

impl OrderSummary {
    pub fn build(order: &Order, items: &[PricedItem], currency: &str) -> Self {
        let c = &order.customer;
        let lines: Vec<String> = items
            .iter()
            .map(|i| format!("{} x{} - {}", i.title, i.quantity, Money::new(i.line_total, currency)))
            .collect();
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
        let quantity: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
        Self {
            order_id: order.order_number.to_string(),
            order_date: order.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            customer_name: c.full_name.clone(),
            customer_email: c.email.clone().unwrap_or_else(|| "Not provided".into()),
            customer_phone: c.phone.clone(),
            customer_address: format!("{}, {}, {}", c.address, c.city, c.postal_code),
            product_name: lines.join("\n"),
            quantity: quantity.to_string(),
            price: format!("{subtotal:.2}"),
            total: format!("{:.2}", order.total_amount),
            notes: c.notes.clone().unwrap_or_else(|| "No notes".into()),
        }
    }
}

/// A destination for order notifications and domain events. Sinks implement
/// whichever of the two they care about.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn order_placed(&self, _summary: &OrderSummary) -> Result<(), NotifyError> { Ok(()) }

    async fn publish(&self, _event: &DomainEvent) -> Result<(), NotifyError> { Ok(()) }
}

/// Fan-out over the configured sinks. Never returns an error.
#[derive(Clone, Default)]
pub struct Notifications {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl Notifications {
    pub fn new(sinks: Vec<Arc<dyn Notifier>>) -> Self { Self { sinks } }

    pub fn is_empty(&self) -> bool { self.sinks.is_empty() }

    pub async fn order_placed(&self, summary: &OrderSummary) {
        for sink in &self.sinks {
            match sink.order_placed(summary).await {
                Ok(()) => debug!(sink = sink.name(), order = %summary.order_id, "order notification sent"),
                Err(e) => warn!(sink = sink.name(), order = %summary.order_id, error = %e, "order notification failed"),
            }
        }
    }

    pub async fn publish(&self, event: &DomainEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event).await {
                warn!(sink = sink.name(), error = %e, "event publish failed");
            }
        }
    }
}

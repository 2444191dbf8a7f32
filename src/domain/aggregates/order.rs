//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{OrderId, OrderItemId, OrderNumber, ProductId};

pub const UNKNOWN: &str = "unknown";

/// Order header.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    #[serde(flatten)]
    pub customer: CustomerInfo,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order. Title and price are snapshots taken when the order was placed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

/// Contact and shipping details. Presence rules are checked at checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    pub notes: Option<String>,
}

/// Best-effort request metadata; each field falls back to `"unknown"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub ip_address: String,
    pub user_agent: String,
    pub source_country: String,
}

impl Default for Provenance {
    fn default() -> Self {
        Self { ip_address: UNKNOWN.into(), user_agent: UNKNOWN.into(), source_country: UNKNOWN.into() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Ordered, Confirmed, Processing, Delivering, Delivered, Cancelled }

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [Self::Ordered, Self::Confirmed, Self::Processing, Self::Delivering, Self::Delivered, Self::Cancelled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Position along the fulfilment path; `None` for `Cancelled`.
    fn step(self) -> Option<u8> {
        match self {
            Self::Ordered => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Delivering => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|st| st.as_str() == wanted).ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Which status changes an admin may make.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any status may be set from any other.
    #[default]
    Open,
    /// Forward steps along the fulfilment path, or cancellation of a non-terminal order.
    Strict,
}

impl StatusPolicy {
    pub fn allows(self, from: OrderStatus, to: OrderStatus) -> bool {
        if from == to { return true; }
        match self {
            Self::Open => true,
            Self::Strict => match (from.step(), to.step()) {
                _ if from.is_terminal() => false,
                (_, None) => true,
                (Some(a), Some(b)) => b > a,
                (None, Some(_)) => false,
            },
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "strict" => Ok(Self::Strict),
            other => Err(format!("expected `open` or `strict`, got `{other}`")),
        }
    }
}

impl Order {
    /// Moves the order to `to` under `policy`, returning the event to publish.
    pub fn transition(&mut self, to: OrderStatus, policy: StatusPolicy) -> Result<OrderEvent, OrderError> {
        let from = self.status;
        if !policy.allows(from, to) { return Err(OrderError::TransitionRejected { from, to }); }
        self.status = to;
        self.touch();
        Ok(OrderEvent::StatusChanged { order_id: self.id.clone(), from, to })
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Cannot move order from {from} to {to}")]
    TransitionRejected { from: OrderStatus, to: OrderStatus },
}

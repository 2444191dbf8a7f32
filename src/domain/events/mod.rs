//! Domain events
use crate::domain::value_objects::{OrderId, OrderNumber, ProductId};
use crate::domain::aggregates::OrderStatus;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: ProductId },
    Updated { product_id: ProductId },
    Deleted { product_id: ProductId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed {
        order_id: OrderId,
        order_number: OrderNumber,
        #[serde(with = "rust_decimal::serde::float")]
        total: Decimal,
    },
    StatusChanged { order_id: OrderId, from: OrderStatus, to: OrderStatus },
    Deleted { order_id: OrderId },
    Voided { order_id: OrderId },
}

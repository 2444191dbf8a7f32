//! Aggregates module
pub mod product;
pub mod order;

pub use product::{ImageMode, Product, ProductDraft, ProductError, ProductRecord};
pub use order::{CustomerInfo, Order, OrderError, OrderItem, OrderStatus, Provenance, StatusPolicy};

//! Storefront Orders
//!
//! Catalog, checkout and order administration for a small cash-on-delivery shop.
//!
//! ## Features
//! - Client-side cart with pluggable persistence
//! - Checkout that re-prices every line from the catalog
//! - Atomic order persistence on PostgreSQL
//! - Best-effort order notifications (webhook, NATS)
//! - Admin order workflow, stats and product management

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod http;
pub mod notify;
pub mod storage;

pub use admin::{AdminError, CatalogAdmin, OrderAdmin};
pub use checkout::{Checkout, CheckoutError};
pub use config::{Config, ConfigError};
pub use http::{router, AppState};

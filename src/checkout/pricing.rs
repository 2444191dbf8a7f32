//! Re-prices a validated cart from the catalog. Client-side prices never get here.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::{CheckoutError, SubmittedItem};
use crate::domain::aggregates::{Product, ProductError, ProductRecord};
use crate::domain::value_objects::ProductId;
use crate::storage::CatalogStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    pub product_id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricedOrder {
    pub items: Vec<PricedItem>,
    pub total: Decimal,
}

/// One batched catalog lookup, then [`price_items`].
pub async fn reconcile(catalog: &dyn CatalogStore, items: &[SubmittedItem]) -> Result<PricedOrder, CheckoutError> {
    let ids: Vec<ProductId> = items.iter().map(|i| i.product_id.clone()).collect();
    let records = catalog.products_by_ids(&ids).await?;
    price_items(items, records)
}

pub fn price_items(items: &[SubmittedItem], records: Vec<ProductRecord>) -> Result<PricedOrder, CheckoutError> {
    let mut by_id: HashMap<ProductId, ProductRecord> = records.into_iter().map(|r| (r.id.clone(), r)).collect();

    let missing: Vec<ProductId> = items.iter().filter(|i| !by_id.contains_key(&i.product_id)).map(|i| i.product_id.clone()).collect();
    if !missing.is_empty() { return Err(CheckoutError::ProductsUnavailable(missing)); }

    let mut priced = Vec::with_capacity(items.len());
    for item in items {
        let Some(record) = by_id.remove(&item.product_id) else { continue };
        if !record.is_active() { return Err(CheckoutError::ProductInactive(record.label())); }
        let product = Product::try_from(record).map_err(|e| match e {
            ProductError::InvalidPrice(label) => CheckoutError::InvalidPrice(label),
            other => CheckoutError::InvalidPrice(other.to_string()),
        })?;
        priced.push(PricedItem {
            line_total: product.price * Decimal::from(item.quantity),
            product_id: product.id,
            title: product.title,
            price: product.price,
            quantity: item.quantity,
        });
    }
    let total = priced.iter().map(|i| i.line_total).sum();
    Ok(PricedOrder { items: priced, total })
}

//! Product administration and the read-only storefront catalog.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use super::{AdminError, LIST_LIMIT};
use crate::domain::aggregates::{ImageMode, Product, ProductDraft, ProductRecord};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::ProductId;
use crate::notify::Notifications;
use crate::storage::CatalogStore;

/// Raw product fields as submitted by an admin.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub title: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image_file_ids: Vec<String>,
    /// Only consulted on update.
    pub image_mode: ImageMode,
}

#[derive(Clone)]
pub struct CatalogAdmin {
    catalog: Arc<dyn CatalogStore>,
    notifications: Notifications,
}

/// Drops records that fail the boundary checks, logging each one.
fn usable(records: Vec<ProductRecord>) -> Vec<Product> {
    records
        .into_iter()
        .filter_map(|r| {
            let id = r.id.clone();
            Product::try_from(r).map_err(|e| warn!(product_id = %id, error = %e, "skipping unusable product")).ok()
        })
        .collect()
}

impl CatalogAdmin {
    pub fn new(catalog: Arc<dyn CatalogStore>, notifications: Notifications) -> Self { Self { catalog, notifications } }

    /// Newest first, inactive included.
    pub async fn list_products(&self) -> Result<Vec<Product>, AdminError> {
        Ok(usable(self.catalog.list_products(false, LIST_LIMIT).await?))
    }

    /// Newest first, active only.
    pub async fn list_active_products(&self) -> Result<Vec<Product>, AdminError> {
        Ok(usable(self.catalog.list_products(true, LIST_LIMIT).await?))
    }

    pub async fn get_product(&self, id: &ProductId) -> Result<Product, AdminError> {
        let record = self.catalog.get_product(id).await?.ok_or_else(|| AdminError::ProductNotFound(id.clone()))?;
        Ok(Product::try_from(record)?)
    }

    pub async fn create_product(&self, input: ProductInput) -> Result<Product, AdminError> {
        let draft = ProductDraft::new(&input.title, input.price, input.description.as_deref(), input.image_file_ids, true)?;
        let product = Product::try_from(self.catalog.insert_product(&draft).await?)?;
        info!(product_id = %product.id, title = %product.title, "product created");
        self.publish(ProductEvent::Created { product_id: product.id.clone() }).await;
        Ok(product)
    }

    pub async fn update_product(&self, id: &ProductId, input: ProductInput) -> Result<Product, AdminError> {
        let existing = self.catalog.get_product(id).await?.ok_or_else(|| AdminError::ProductNotFound(id.clone()))?;
        let images = input.image_mode.merge(existing.image_file_ids, input.image_file_ids);
        let draft = ProductDraft::new(&input.title, input.price, input.description.as_deref(), images, false)?;
        let record = self.catalog.update_product(id, &draft).await?.ok_or_else(|| AdminError::ProductNotFound(id.clone()))?;
        info!(product_id = %id, "product updated");
        self.publish(ProductEvent::Updated { product_id: id.clone() }).await;
        Ok(Product::try_from(record)?)
    }

    pub async fn set_product_active(&self, id: &ProductId, active: bool) -> Result<Product, AdminError> {
        let record = self.catalog.set_product_active(id, active).await?.ok_or_else(|| AdminError::ProductNotFound(id.clone()))?;
        info!(product_id = %id, active, "product visibility changed");
        self.publish(ProductEvent::Updated { product_id: id.clone() }).await;
        Ok(Product::try_from(record)?)
    }

    pub async fn delete_product(&self, id: &ProductId) -> Result<(), AdminError> {
        if !self.catalog.delete_product(id).await? {
            return Err(AdminError::ProductNotFound(id.clone()));
        }
        info!(product_id = %id, "product deleted");
        self.publish(ProductEvent::Deleted { product_id: id.clone() }).await;
        Ok(())
    }

    async fn publish(&self, event: ProductEvent) { self.notifications.publish(&DomainEvent::Product(event)).await }
}

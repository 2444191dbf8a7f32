//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProductId;

/// A catalog product whose fields have passed the storage boundary checks.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: Option<String>,
    pub image_file_ids: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product as the store hands it back. Nothing here is trusted until
/// converted into a [`Product`].
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: ProductId,
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image_file_ids: Vec<String>,
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Title when present, otherwise the id; used in customer-facing messages.
    pub fn label(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => format!("{t} ({})", self.id),
            _ => self.id.to_string(),
        }
    }

    /// A missing flag counts as active.
    pub fn is_active(&self) -> bool { self.is_active != Some(false) }
}

impl TryFrom<ProductRecord> for Product {
    type Error = ProductError;
    fn try_from(r: ProductRecord) -> Result<Self, Self::Error> {
        let price = match r.price {
            Some(p) if p >= Decimal::ZERO => p,
            _ => return Err(ProductError::InvalidPrice(r.label())),
        };
        Ok(Self {
            is_active: r.is_active(),
            title: r.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            id: r.id, price, description: r.description, image_file_ids: r.image_file_ids,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

/// Validated input for creating or replacing a product.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductDraft { pub title: String, pub price: Decimal, pub description: Option<String>, pub image_file_ids: Vec<String> }

/// How new image references combine with the existing ones on update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode { #[default] Append, Replace }

impl ImageMode {
    pub fn merge(self, existing: Vec<String>, added: Vec<String>) -> Vec<String> {
        match self {
            Self::Replace => added,
            Self::Append => existing.into_iter().chain(added).collect(),
        }
    }
}

impl ProductDraft {
    /// Trims and checks raw admin input. `require_images` is set on create.
    pub fn new(title: &str, price: Option<Decimal>, description: Option<&str>, image_file_ids: Vec<String>, require_images: bool) -> Result<Self, ProductError> {
        let title = title.trim();
        if title.is_empty() { return Err(ProductError::MissingTitle); }
        let price = price.ok_or(ProductError::MissingPrice)?;
        if price < Decimal::ZERO { return Err(ProductError::InvalidPrice(title.to_string())); }
        let image_file_ids: Vec<String> = image_file_ids.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        if require_images && image_file_ids.is_empty() { return Err(ProductError::MissingImages); }
        let description = description.map(str::trim).filter(|d| !d.is_empty()).map(String::from);
        Ok(Self { title: title.to_string(), price, description, image_file_ids })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Price is required")]
    MissingPrice,
    #[error("Upload at least 1 image")]
    MissingImages,
    #[error("Invalid price for product: {0}")]
    InvalidPrice(String),
}

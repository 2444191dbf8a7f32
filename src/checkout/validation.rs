//! Normalizes a raw order submission before anything touches the catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use super::CheckoutError;
use crate::domain::aggregates::CustomerInfo;
use crate::domain::value_objects::ProductId;

/// Form fields as they arrive, before trimming. `items` is the JSON-encoded
/// `[{productId, quantity}]` array.
#[derive(Clone, Debug, Default)]
pub struct RawOrderForm {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub items: String,
}

impl RawOrderForm {
    /// Reads a JSON request body. Scalar fields of any JSON type are
    /// stringified; `items` is re-encoded as-is (missing means `[]`).
    pub fn from_json(body: &Value) -> Self {
        let text = |key: &str| match body.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let items = match body.get("items") {
            None | Some(Value::Null) => "[]".to_string(),
            Some(v) => v.to_string(),
        };
        Self {
            full_name: text("fullName"), phone: text("phone"), email: text("email"), address: text("address"),
            city: text("city"), postal_code: text("postalCode"), notes: text("notes"), items,
        }
    }
}

/// A cart line as submitted by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Output of validation: trimmed customer info and a deduplicated item list.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedOrder {
    pub customer: CustomerInfo,
    pub items: Vec<SubmittedItem>,
}

/// Largest quantity a single order line may carry; order items are stored as
/// 32-bit signed integers.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Reporting order when several required fields are missing.
const FIELD_ORDER: [&str; 5] = ["full_name", "phone", "address", "city", "postal_code"];

fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    FIELD_ORDER
        .iter()
        .find_map(|f| fields.get(f).and_then(|errs| errs.first()).and_then(|e| e.message.as_ref()))
        .map(|m| m.to_string())
        .unwrap_or_else(|| "Invalid order details".to_string())
}

fn trimmed(v: &Option<String>) -> String { v.as_deref().map(str::trim).unwrap_or_default().to_string() }

fn optional(v: &Option<String>) -> Option<String> { Some(trimmed(v)).filter(|s| !s.is_empty()) }

pub fn validate(form: &RawOrderForm) -> Result<ValidatedOrder, CheckoutError> {
    let customer = CustomerInfo {
        full_name: trimmed(&form.full_name),
        phone: trimmed(&form.phone),
        email: optional(&form.email),
        address: trimmed(&form.address),
        city: trimmed(&form.city),
        postal_code: trimmed(&form.postal_code),
        notes: optional(&form.notes),
    };
    customer.validate().map_err(|e| CheckoutError::Validation(first_message(&e)))?;

    let items = merge_duplicates(parse_items(&form.items));
    if items.is_empty() { return Err(CheckoutError::EmptyCart); }
    if let Some(item) = items.iter().find(|i| i.quantity > MAX_QUANTITY) {
        return Err(CheckoutError::Validation(format!("Quantity too large for product: {}", item.product_id)));
    }
    Ok(ValidatedOrder { customer, items })
}

/// Unparseable or non-array input is an empty cart; invalid entries are dropped.
pub fn parse_items(raw: &str) -> Vec<SubmittedItem> {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(raw) else { return Vec::new() };
    entries
        .iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            let product_id = ProductId::parse(id_text(obj.get("productId")))?;
            let quantity = coerce_quantity(obj.get("quantity").unwrap_or(&Value::Null))?;
            Some(SubmittedItem { product_id, quantity })
        })
        .collect()
}

/// Sums quantities of repeated ids, keeping first-seen order.
pub fn merge_duplicates(items: Vec<SubmittedItem>) -> Vec<SubmittedItem> {
    let mut merged: Vec<SubmittedItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<ProductId, usize> = HashMap::new();
    for item in items {
        match index.get(&item.product_id) {
            Some(&i) => merged[i].quantity = merged[i].quantity.saturating_add(item.quantity),
            None => {
                index.insert(item.product_id.clone(), merged.len());
                merged.push(item);
            }
        }
    }
    merged
}

fn id_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Floors numeric input; `None` unless the result is a positive `u32`.
fn coerce_quantity(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => return None,
    };
    if !n.is_finite() { return None; }
    let n = n.floor();
    if n < 1.0 || n > f64::from(u32::MAX) { return None; }
    Some(n as u32)
}

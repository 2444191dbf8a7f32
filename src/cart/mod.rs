//! Client-side cart accumulator.
//!
//! Lines live in an injectable [`CartStore`]; every mutation is written through
//! and followed by a change notification carrying the new badge count, so
//! observers can refresh without polling.

mod store;

pub use store::{CartStore, FileCartStore, MemoryCartStore};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::checkout::SubmittedItem;
use crate::domain::value_objects::ProductId;

/// One product in the cart. Title, price and image are display hints only;
/// checkout re-prices everything from the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub title: String,
    pub price: Decimal,
    pub image: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

/// Display snapshot captured when a product is first added.
#[derive(Clone, Debug, PartialEq)]
pub struct CartSnapshot { pub title: String, pub price: Decimal, pub image: Option<String> }

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Cart storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cart encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub struct Cart<S> {
    store: S,
    changes: watch::Sender<u32>,
}

impl<S: CartStore> Cart<S> {
    pub fn new(store: S) -> Result<Self, CartError> {
        let count = count_of(&store.list()?);
        let (changes, _) = watch::channel(count);
        Ok(Self { store, changes })
    }

    /// Receives the item count after each mutation.
    pub fn subscribe(&self) -> watch::Receiver<u32> { self.changes.subscribe() }

    pub fn add_or_increment(&mut self, product_id: ProductId, snapshot: CartSnapshot) -> Result<(), CartError> {
        let line = match self.store.get(&product_id)? {
            Some(mut existing) => { existing.quantity = existing.quantity.saturating_add(1); existing }
            None => CartLine { product_id, quantity: 1, title: snapshot.title, price: snapshot.price, image: snapshot.image },
        };
        self.store.set(line)?;
        self.changed()
    }

    /// Non-positive quantities remove the line. Unknown ids are ignored.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 { return self.remove(product_id); }
        let Some(mut line) = self.store.get(product_id)? else { return Ok(()) };
        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.store.set(line)?;
        self.changed()
    }

    pub fn remove(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        self.store.remove(product_id)?;
        self.changed()
    }

    pub fn clear(&mut self) -> Result<(), CartError> {
        self.store.clear()?;
        self.changed()
    }

    pub fn lines(&self) -> Result<Vec<CartLine>, CartError> { self.store.list() }

    pub fn count(&self) -> Result<u32, CartError> { Ok(count_of(&self.store.list()?)) }

    /// Display total from the cached snapshots.
    pub fn total(&self) -> Result<Decimal, CartError> { Ok(self.store.list()?.iter().map(CartLine::line_total).sum()) }

    /// The `{productId, quantity}` payload sent to checkout.
    pub fn to_submission(&self) -> Result<Vec<SubmittedItem>, CartError> {
        Ok(self.store.list()?.into_iter().map(|l| SubmittedItem { product_id: l.product_id, quantity: l.quantity }).collect())
    }

    fn changed(&self) -> Result<(), CartError> {
        let count = self.count()?;
        self.changes.send_replace(count);
        tracing::debug!(count, "cart updated");
        Ok(())
    }
}

fn count_of(lines: &[CartLine]) -> u32 { lines.iter().fold(0u32, |acc, l| acc.saturating_add(l.quantity)) }

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId { ProductId::parse(s).unwrap() }
    fn snap(price: i64) -> CartSnapshot { CartSnapshot { title: "Widget".into(), price: Decimal::new(price, 0), image: None } }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new(MemoryCartStore::default()).unwrap();
        cart.add_or_increment(pid("P1"), snap(10)).unwrap();
        cart.add_or_increment(pid("P1"), snap(99)).unwrap();
        cart.add_or_increment(pid("P2"), snap(5)).unwrap();
        assert_eq!(cart.count().unwrap(), 3);
        assert_eq!(cart.lines().unwrap().len(), 2);
        // first snapshot wins
        assert_eq!(cart.total().unwrap(), Decimal::new(25, 0));

        cart.set_quantity(&pid("P2"), 4).unwrap();
        assert_eq!(cart.count().unwrap(), 6);
        cart.set_quantity(&pid("P2"), 0).unwrap();
        assert_eq!(cart.count().unwrap(), 2);
        cart.set_quantity(&pid("missing"), 3).unwrap();
        assert_eq!(cart.lines().unwrap().len(), 1);

        cart.remove(&pid("P1")).unwrap();
        assert_eq!(cart.count().unwrap(), 0);
    }

    #[test]
    fn test_change_notifications() {
        let mut cart = Cart::new(MemoryCartStore::default()).unwrap();
        let mut rx = cart.subscribe();
        assert!(!rx.has_changed().unwrap());
        cart.add_or_increment(pid("P1"), snap(10)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
        cart.clear().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 0);
    }

    #[test]
    fn test_submission_payload() {
        let mut cart = Cart::new(MemoryCartStore::default()).unwrap();
        cart.add_or_increment(pid("P1"), snap(10)).unwrap();
        cart.set_quantity(&pid("P1"), 3).unwrap();
        let json = serde_json::to_value(cart.to_submission().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!([{ "productId": "P1", "quantity": 3 }]));
    }
}

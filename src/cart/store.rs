use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CartError, CartLine};
use crate::domain::value_objects::ProductId;

/// Key-value storage for cart lines, keyed by product id.
pub trait CartStore {
    fn get(&self, product_id: &ProductId) -> Result<Option<CartLine>, CartError>;
    fn set(&mut self, line: CartLine) -> Result<(), CartError>;
    fn remove(&mut self, product_id: &ProductId) -> Result<(), CartError>;
    fn clear(&mut self) -> Result<(), CartError>;
    fn list(&self) -> Result<Vec<CartLine>, CartError>;
}

#[derive(Debug, Default)]
pub struct MemoryCartStore {
    lines: BTreeMap<ProductId, CartLine>,
}

impl CartStore for MemoryCartStore {
    fn get(&self, product_id: &ProductId) -> Result<Option<CartLine>, CartError> { Ok(self.lines.get(product_id).cloned()) }
    fn set(&mut self, line: CartLine) -> Result<(), CartError> { self.lines.insert(line.product_id.clone(), line); Ok(()) }
    fn remove(&mut self, product_id: &ProductId) -> Result<(), CartError> { self.lines.remove(product_id); Ok(()) }
    fn clear(&mut self) -> Result<(), CartError> { self.lines.clear(); Ok(()) }
    fn list(&self) -> Result<Vec<CartLine>, CartError> { Ok(self.lines.values().cloned().collect()) }
}

/// JSON file backed store; survives restarts. Every mutation rewrites the file.
#[derive(Debug)]
pub struct FileCartStore {
    path: PathBuf,
    inner: MemoryCartStore,
}

impl FileCartStore {
    /// Loads `path` if it exists. Entries that no longer decode are dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CartError> {
        let path = path.as_ref().to_path_buf();
        let mut inner = MemoryCartStore::default();
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cart file, starting empty");
                Vec::new()
            });
            for entry in entries {
                match serde_json::from_value::<CartLine>(entry) {
                    Ok(line) if line.quantity > 0 => { inner.lines.insert(line.product_id.clone(), line); }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "skipping malformed cart entry"),
                }
            }
        }
        Ok(Self { path, inner })
    }

    fn flush(&self) -> Result<(), CartError> {
        let lines: Vec<&CartLine> = self.inner.lines.values().collect();
        fs::write(&self.path, serde_json::to_vec_pretty(&lines)?)?;
        Ok(())
    }
}

impl CartStore for FileCartStore {
    fn get(&self, product_id: &ProductId) -> Result<Option<CartLine>, CartError> { self.inner.get(product_id) }
    fn set(&mut self, line: CartLine) -> Result<(), CartError> { self.inner.set(line)?; self.flush() }
    fn remove(&mut self, product_id: &ProductId) -> Result<(), CartError> { self.inner.remove(product_id)?; self.flush() }
    fn clear(&mut self) -> Result<(), CartError> { self.inner.clear()?; self.flush() }
    fn list(&self) -> Result<Vec<CartLine>, CartError> { self.inner.list() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Cart, CartSnapshot};
    use rust_decimal::Decimal;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        {
            let mut cart = Cart::new(FileCartStore::open(&path).unwrap()).unwrap();
            let snap = CartSnapshot { title: "Tea".into(), price: Decimal::new(1250, 2), image: Some("img-1".into()) };
            cart.add_or_increment(ProductId::parse("P1").unwrap(), snap.clone()).unwrap();
            cart.add_or_increment(ProductId::parse("P1").unwrap(), snap).unwrap();
        }
        let cart = Cart::new(FileCartStore::open(&path).unwrap()).unwrap();
        assert_eq!(cart.count().unwrap(), 2);
        assert_eq!(cart.lines().unwrap()[0].image.as_deref(), Some("img-1"));
    }

    #[test]
    fn test_file_store_drops_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, r#"[{"productId":"P1","quantity":2,"title":"A","price":"3","image":null},{"oops":true}]"#).unwrap();
        let store = FileCartStore::open(&path).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        fs::write(&path, "not json").unwrap();
        assert!(FileCartStore::open(&path).unwrap().list().unwrap().is_empty());
    }
}

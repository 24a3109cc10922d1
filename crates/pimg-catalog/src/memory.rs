use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::product::{NewProduct, Product};

/// In-memory product catalog.
///
/// Products are kept in id order behind a `RwLock`. Ids are assigned as one
/// past the current maximum.
pub struct ProductCatalog {
    products: RwLock<BTreeMap<u64, Product>>,
}

impl ProductCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            products: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a catalog pre-filled with `items`, numbered from 1.
    #[cfg(test)]
    pub fn with_products(items: impl IntoIterator<Item = NewProduct>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.add(item);
        }
        catalog
    }

    /// All products, ordered by id.
    pub fn list(&self) -> Vec<Product> {
        self.products
            .read()
            .expect("lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<Product> {
        self.products.read().expect("lock poisoned").get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().expect("lock poisoned").is_empty()
    }

    /// Insert a new product and return it with its assigned id.
    pub fn add(&self, item: NewProduct) -> Product {
        let mut map = self.products.write().expect("lock poisoned");
        let id = map.keys().next_back().map_or(1, |max| max + 1);
        let now = Utc::now();
        let product = Product {
            id,
            name: item.name,
            description: item.description,
            price: item.price,
            sku: item.sku,
            created_on: now,
            updated_on: now,
        };
        map.insert(id, product.clone());
        debug!(id, "added product");
        product
    }

    /// Replace the fields of product `id`, keeping its creation time.
    pub fn update(&self, id: u64, item: NewProduct) -> CatalogResult<Product> {
        let mut map = self.products.write().expect("lock poisoned");
        let product = map.get_mut(&id).ok_or(CatalogError::ProductNotFound(id))?;
        product.name = item.name;
        product.description = item.description;
        product.price = item.price;
        product.sku = item.sku;
        product.updated_on = Utc::now();
        debug!(id, "updated product");
        Ok(product.clone())
    }
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> NewProduct {
        NewProduct::new("Latte", "Frothy milky coffee", 2.45, "abc323")
    }

    fn espresso() -> NewProduct {
        NewProduct::new("Espresso", "Short and strong coffee without milk", 1.99, "fjd34")
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let catalog = ProductCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.add(latte()).id, 1);
        assert_eq!(catalog.add(espresso()).id, 2);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let catalog = ProductCatalog::with_products([latte(), espresso()]);
        let names: Vec<_> = catalog.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Latte", "Espresso"]);
    }

    #[test]
    fn update_replaces_fields() {
        let catalog = ProductCatalog::with_products([latte()]);
        let created = catalog.get(1).unwrap().created_on;
        let updated = catalog
            .update(1, NewProduct::new("Cappuccino", "steamed milk foam", 5.0, "prod-bev-001"))
            .unwrap();
        assert_eq!(updated.name, "Cappuccino");
        assert_eq!(updated.created_on, created);
        assert!(updated.updated_on >= created);
        assert_eq!(catalog.get(1).unwrap(), updated);
    }

    #[test]
    fn update_missing_product() {
        let catalog = ProductCatalog::new();
        let err = catalog.update(42, latte()).unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(42)));
    }
}

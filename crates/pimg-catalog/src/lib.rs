//! Product catalog for the product images service.
//!
//! A small in-memory store of products exposed over REST by `pimg-server`.
//! It shares no state with image storage.

pub mod error;
pub mod memory;
pub mod product;

pub use error::{CatalogError, CatalogResult};
pub use memory::ProductCatalog;
pub use product::{NewProduct, Product};

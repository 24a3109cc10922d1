use std::sync::Arc;

use pimg_catalog::ProductCatalog;
use pimg_store::{FileStore, LocalStorage};

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FileStore>,
    pub catalog: Arc<ProductCatalog>,
    /// Request body ceiling enforced by the router, reported when an upload
    /// stream is cut off by it.
    pub max_body_size: u64,
}

impl AppState {
    pub fn new(store: Arc<dyn FileStore>, catalog: Arc<ProductCatalog>, max_body_size: u64) -> Self {
        Self {
            store,
            catalog,
            max_body_size,
        }
    }

    /// Open local storage under `config.base_path` with an empty catalog.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let store = LocalStorage::new(&config.storage_config())?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(ProductCatalog::new()),
            config.max_body_size,
        ))
    }
}

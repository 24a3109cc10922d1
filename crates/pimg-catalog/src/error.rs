use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    ProductNotFound(u64),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

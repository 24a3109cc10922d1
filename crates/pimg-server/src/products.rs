use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pimg_catalog::{NewProduct, Product};
use tracing::info;

use crate::error::ServerResult;
use crate::state::AppState;

/// `GET /products`
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog.list())
}

/// `POST /products`
pub async fn add_product(
    State(state): State<AppState>,
    Json(item): Json<NewProduct>,
) -> (StatusCode, Json<Product>) {
    let product = state.catalog.add(item);
    info!(id = product.id, sku = %product.sku, "product created");
    (StatusCode::CREATED, Json(product))
}

/// `PUT /products/:id`
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(item): Json<NewProduct>,
) -> ServerResult<Json<Product>> {
    let product = state.catalog.update(id, item)?;
    info!(id, "product updated");
    Ok(Json(product))
}

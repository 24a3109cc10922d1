use axum::response::Json;
use serde_json::json;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "product-images",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

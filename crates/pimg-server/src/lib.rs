//! HTTP server for product images.
//!
//! Accepts image uploads as a raw request body or as multipart forms, stores
//! them through [`pimg_store`], serves them back by `{id}/{filename}`, and
//! hosts the product catalog REST API.

pub mod config;
pub mod error;
pub mod files;
pub mod handler;
pub mod products;
pub mod router;
pub mod server;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{ServerConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_FILE_SIZE};
pub use error::{ServerError, ServerResult};
pub use files::{MultipartReport, PartResult, PartStatus, StoredFile};
pub use router::build_router;
pub use server::ImageServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::util::ServiceExt;

    use crate::testing::{json_body, request, TestApp};

    #[tokio::test]
    async fn health_endpoint() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(request(Method::GET, "/health", "", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(request(Method::GET, "/nope", "", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = TestApp::new();
        let mut req = request(Method::GET, "/health", "", "");
        req.headers_mut()
            .insert("origin", "http://localhost:3000".parse().unwrap());
        let response = app.router().oneshot(req).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }
}

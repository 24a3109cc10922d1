use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::{files, handler, products};

/// Build the axum router with all endpoints and transport layers.
///
/// The body limit here bounds whole requests; the per-object ceiling is
/// enforced by the store while streaming.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/health", get(handler::health_handler))
        .route("/", post(files::upload_multipart))
        .route(
            "/images/:id/:filename",
            post(files::upload_rest).get(files::serve_image),
        )
        .route("/products", get(products::list_products).post(products::add_product))
        .route("/products/:id", put(products::update_product))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit(config.max_body_size)))
        .layer(TimeoutLayer::new(config.request_timeout()));

    let router = match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}

fn body_limit(max: u64) -> usize {
    usize::try_from(max).unwrap_or(usize::MAX)
}

fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    let origin = config.allowed_origin.as_deref()?;
    match HeaderValue::from_str(origin) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT]),
        ),
        Err(_) => {
            warn!(origin, "ignoring invalid allowed origin");
            None
        }
    }
}

pub mod health;
pub mod options;
pub mod submit;
pub mod templates;

use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// All application routes with state applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../../static/index.html")) }))
        .route(
            "/admin/template",
            get(|| async { Html(include_str!("../../static/admin.html")) }),
        )
        .route("/health", get(health::health_check))
        .route("/api/templates", get(templates::list_templates))
        .route("/api/lark/create-template", post(templates::create_template))
        .route("/api/lark/options", get(options::get_options))
        .route(
            "/api/option-version",
            get(options::get_option_version).post(options::bump_option_version),
        )
        .route("/api/submit-request", post(submit::submit_request))
        .route("/api/admin/templates", post(submit::request_slide_copy))
        .with_state(state)
}

/// Cross-cutting HTTP layers.
pub fn with_layers(router: Router, max_body_bytes: usize) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        // Multipart's own 2 MB default is replaced by the configured limit.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

//! REST surface: the axum router and its shared state.

pub mod error;
pub mod handlers;
pub mod openapi;

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Connection pool shared by all requests
    pub database: Arc<DatabaseConnection>,
}

impl AppState {
    /// Wraps a connection pool for sharing across handlers.
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database: Arc::new(database),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/benefits",
            get(handlers::list_benefits).post(handlers::create_benefit),
        )
        .route("/benefits/search", get(handlers::search_benefits))
        .route("/benefits/transfer", post(handlers::transfer_value))
        .route(
            "/benefits/{id}",
            get(handlers::get_benefit)
                .put(handlers::update_benefit)
                .delete(handlers::delete_benefit),
        )
        .with_state(state)
        .merge(
            SwaggerUi::new("/docs").url(openapi::OPENAPI_JSON_PATH, openapi::ApiDoc::openapi()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

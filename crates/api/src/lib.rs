//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for profile fields and uploads
//! - The user upload serving endpoints
//! - Authentication middleware and extractors
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod realm;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parley_core::upload::UploadBackend;
use parley_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Where uploaded files live.
    pub upload_backend: Arc<UploadBackend>,
    /// Per-file upload limit in MiB.
    pub max_file_upload_size_mib: u64,
    /// Public host; realms are its subdomains.
    pub external_host: String,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .merge(routes::uploads::serve_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! HTTP surface: the resource routes, CORS and request tracing.

pub mod handlers;
pub mod response;

use crate::core::{
    DocumentStore, Resource,
    resources::{CATEGORIAS, NEGOCIOS, USUARIOS},
};
use axum::{
    Extension, Router,
    http::Method,
    routing::{MethodRouter, get},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Document store client
    pub documents: DocumentStore,
    /// Include raw error messages in 500 responses
    pub expose_error_details: bool,
}

fn resource_routes(resource: &'static Resource) -> MethodRouter<ApiState> {
    get(handlers::list)
        .post(handlers::create)
        .put(handlers::update)
        .delete(handlers::delete)
        .options(handlers::options)
        .fallback(handlers::method_not_allowed)
        .layer(Extension(resource))
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/categorias", resource_routes(&CATEGORIAS))
        .route("/api/negocios", resource_routes(&NEGOCIOS))
        .route("/api/usuarios", resource_routes(&USUARIOS))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Route definitions for the Retail Stock Count Platform

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - taxonomy reference data
        .nest("/taxonomy", taxonomy_routes())
        // Protected routes - debounced barcode scanning
        .nest("/scan", scan_routes())
        // Protected routes - stock-count reconciliation
        .nest("/stock-count", stock_count_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - photo autofill
        .nest("/autofill", autofill_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

/// Taxonomy routes (protected)
fn taxonomy_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:category_id/subcategories",
            get(handlers::list_subcategories_for),
        )
        .route("/subcategories", post(handlers::create_subcategory))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Scan routes (protected)
fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::scan_barcode))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock-count routes (protected)
fn stock_count_routes() -> Router<AppState> {
    Router::new()
        .route("/reconcile", post(handlers::reconcile))
        .route("/bulk", post(handlers::reconcile_bulk))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/options", get(handlers::product_options))
        .route(
            "/:product_id/adjustments",
            get(handlers::product_adjustments),
        )
        .route("/:product_id", delete(handlers::deactivate_product))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Photo autofill routes (protected)
fn autofill_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::autofill))
        .route_layer(middleware::from_fn(auth_middleware))
}

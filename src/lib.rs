pub mod assistant;
pub mod checkout;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::assistant::Assistant;
use crate::checkout::CheckoutDesk;
use crate::config::PosConfig;
use crate::services::{Database, ReportSource};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: PosConfig,
    pub db: Database,
    pub desk: CheckoutDesk,
    pub reports: Arc<dyn ReportSource>,
    pub assistant: Arc<Assistant>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/db", get(handlers::db_health_check))
        .route("/metrics", get(handlers::metrics_handler))
        // Orders and catalog
        .route("/api/orders", post(handlers::orders::create_order))
        .route("/api/products", get(handlers::products::list_products))
        // Assistant
        .route("/api/ai/ask", post(handlers::ask::ask))
        // Registers and carts
        .route("/api/registers", post(handlers::registers::open_register))
        .route(
            "/api/registers/:register_id",
            delete(handlers::registers::close_register),
        )
        .route(
            "/api/registers/:register_id/cart",
            get(handlers::registers::view_cart).delete(handlers::registers::clear_cart),
        )
        .route(
            "/api/registers/:register_id/cart/items",
            post(handlers::registers::add_item),
        )
        .route(
            "/api/registers/:register_id/cart/items/:product_id/increment",
            post(handlers::registers::increment_item),
        )
        .route(
            "/api/registers/:register_id/cart/items/:product_id/decrement",
            post(handlers::registers::decrement_item),
        )
        .route(
            "/api/registers/:register_id/cart/items/:product_id",
            delete(handlers::registers::remove_item),
        )
        .route(
            "/api/registers/:register_id/checkout",
            post(handlers::registers::checkout_register),
        )
        .route(
            "/api/registers/:register_id/tabs",
            post(handlers::registers::save_tab),
        )
        // Tabs
        .route("/api/tabs", get(handlers::tabs::list_tabs))
        .route(
            "/api/tabs/:tab_id/checkout",
            post(handlers::tabs::settle_tab),
        )
        .route("/api/tabs/:tab_id/cancel", post(handlers::tabs::cancel_tab))
        // Reports
        .route("/api/reports/orders-count", get(handlers::reports::orders_count))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

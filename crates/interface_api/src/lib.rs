//! HTTP API Layer
//!
//! REST API for combined sales returns using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin wrappers turning requests into service calls
//! - **Middleware**: JWT authentication and audit logging
//! - **DTOs**: request and response bodies
//! - **Error Handling**: consistent JSON error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(service, health, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_returns::SalesReturnService;

use crate::config::ApiConfig;
use crate::handlers::{health, invoice_items, sales_returns};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SalesReturnService>,
    /// Adapter checked by the readiness endpoint
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        service: Arc<SalesReturnService>,
        health: Arc<dyn HealthCheckable>,
        config: ApiConfig,
    ) -> Self {
        Self {
            service,
            health,
            config,
        }
    }
}

/// Creates the main API router
///
/// Health routes are public; everything under `/api/v1` needs a bearer
/// token. Every response carries an `x-request-id` header.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let return_routes = Router::new()
        .route("/", post(sales_returns::create_return).get(sales_returns::list_returns))
        .route("/:id", get(sales_returns::get_return).put(sales_returns::update_return))
        .route("/:id/submit", post(sales_returns::submit_return))
        .route("/:id/credit-notes", post(sales_returns::create_credit_notes));

    let api_routes = Router::new()
        .nest("/sales-returns", return_routes)
        .route("/sales-invoice-items", get(invoice_items::get_sales_invoice_items))
        .route("/amount-in-words", get(invoice_items::amount_in_words))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

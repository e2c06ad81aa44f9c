//! Jarsy storefront API service.
//!
//! A thin backend-for-frontend over a Medusa-style headless commerce API.
//! It owns the per-shopper state the backend does not: the active cart ID,
//! the auth token, and the checkout step, all kept in the HTTP session.
//! Everything else is fetched fresh from the backend, which stays the
//! single source of truth.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod commerce;
pub mod config;
pub mod customer;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod suggest;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with sessions and tracing attached.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(middleware::create_session_layer())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies commerce backend connectivity before returning OK.
/// Returns 503 Service Unavailable if the backend is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.commerce().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Commerce backend not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

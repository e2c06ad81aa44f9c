//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cart::{CartError, CartStoreError};
use crate::checkout::CheckoutError;
use crate::commerce::CommerceError;
use crate::suggest::SuggestError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce backend operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Cart container operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout sequencing failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Suggestion generation failed.
    #[error("Suggestion error: {0}")]
    Suggest(#[from] SuggestError),

    /// Session read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Form input failed validation; one message per offending field.
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// A feature is not configured on this deployment.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => commerce_status(err),
            Self::Cart(err) => match err {
                CartError::Commerce(inner) => commerce_status(inner),
                CartError::Store(CartStoreError::Session(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::WrongStep { .. } => StatusCode::CONFLICT,
                CheckoutError::NotCompleted(_) => StatusCode::PAYMENT_REQUIRED,
                CheckoutError::Commerce(inner) => commerce_status(inner),
            },
            Self::Suggest(err) => match err {
                SuggestError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

fn commerce_status(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::NotFound(_) => StatusCode::NOT_FOUND,
        CommerceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CommerceError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        CommerceError::Api { status, .. } if *status >= 400 && *status < 500 => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server-side failures to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Session(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Validation(fields) => {
                json!({ "error": "Validation failed", "fields": fields })
            }
            Self::Commerce(err) | Self::Cart(CartError::Commerce(err)) => commerce_body(err),
            Self::Checkout(err) => match err {
                CheckoutError::Commerce(inner) => commerce_body(inner),
                CheckoutError::NotCompleted(_) => {
                    json!({ "error": "Payment was not authorized" })
                }
                CheckoutError::WrongStep { .. } => json!({ "error": err.to_string() }),
            },
            Self::Suggest(_) => json!({ "error": "Suggestion service error" }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

fn commerce_body(err: &CommerceError) -> serde_json::Value {
    match err {
        CommerceError::NotFound(message) => json!({ "error": message }),
        CommerceError::Unauthenticated => json!({ "error": "Not authenticated" }),
        CommerceError::RateLimited(seconds) => {
            json!({ "error": format!("Rate limited, retry after {seconds} seconds") })
        }
        CommerceError::Api { message, .. } => json!({ "error": message }),
        CommerceError::Http(_) | CommerceError::Parse(_) => {
            json!({ "error": "External service error" })
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a customer ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

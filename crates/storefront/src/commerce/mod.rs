//! Commerce backend client and operation contracts.
//!
//! # Architecture
//!
//! - The backend (a Medusa-style headless commerce API) is the source of
//!   truth - NO local sync, direct API calls
//! - Responses are deserialized into explicit typed contracts at the
//!   boundary ([`types`])
//! - Operations are split into small traits (`CartOps`, `CheckoutOps`,
//!   `CustomerOps`, `CatalogOps`) so state containers can be exercised
//!   against in-memory fakes
//! - In-memory caching via `moka` for catalog reads (5 minute TTL); cart
//!   and customer state is never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use jarsy_storefront::commerce::{CartOps, CommerceClient};
//!
//! let client = CommerceClient::new(&config.commerce);
//!
//! // Create a cart and add an item
//! let cart = client.create_cart(&region_id).await?;
//! let cart = client.add_line_item(&cart.id, &variant_id, 1).await?;
//! ```

mod client;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use jarsy_core::{
    AddressId, CartId, Email, LineItemId, PaymentProviderId, RegionId, ShippingOptionId, VariantId,
};

/// Errors that can occur when calling the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status with a message.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// No authenticated session for a customer-scoped call.
    ///
    /// An expected state, not a failure: callers treat it as "no customer".
    #[error("not authenticated")]
    Unauthenticated,

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl CommerceError {
    /// Whether this error means the referenced resource no longer exists.
    ///
    /// Drives the cart container's sole automatic-recovery path.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Cart create/retrieve and line-item mutations.
#[async_trait]
pub trait CartOps: Send + Sync {
    /// Create a new cart in the given region.
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError>;

    /// Retrieve an existing cart.
    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError>;

    /// Add a variant to the cart.
    async fn add_line_item(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError>;

    /// Change the quantity of an existing line item.
    async fn update_line_item(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError>;

    /// Remove a line item from the cart.
    async fn remove_line_item(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
    ) -> Result<Cart, CommerceError>;
}

/// Checkout mutations against an active cart.
#[async_trait]
pub trait CheckoutOps: Send + Sync {
    /// Set the shipping address and contact email on the cart.
    async fn set_cart_details(
        &self,
        cart_id: &CartId,
        email: &Email,
        address: &AddressPayload,
    ) -> Result<Cart, CommerceError>;

    /// List shipping options available for the cart.
    async fn list_shipping_options(
        &self,
        cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, CommerceError>;

    /// Add a shipping method created from the given option.
    async fn add_shipping_method(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CommerceError>;

    /// Initialize payment sessions for all available providers.
    async fn create_payment_sessions(&self, cart_id: &CartId) -> Result<Cart, CommerceError>;

    /// Select the payment provider to use.
    async fn select_payment_session(
        &self,
        cart_id: &CartId,
        provider_id: &PaymentProviderId,
    ) -> Result<Cart, CommerceError>;

    /// Complete the cart, placing an order if payment authorizes.
    async fn complete_cart(&self, cart_id: &CartId) -> Result<CartCompletion, CommerceError>;
}

/// Authentication and customer-record operations.
#[async_trait]
pub trait CustomerOps: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, email: &Email, password: &str) -> Result<AuthToken, CommerceError>;

    /// Register a new customer account.
    async fn register(&self, input: &RegisterInput) -> Result<Customer, CommerceError>;

    /// Invalidate the session behind the token.
    async fn logout(&self, token: &AuthToken) -> Result<(), CommerceError>;

    /// Retrieve the customer behind the token.
    ///
    /// Fails with [`CommerceError::Unauthenticated`] when the token is
    /// missing or expired.
    async fn current_customer(&self, token: &AuthToken) -> Result<Customer, CommerceError>;

    /// Update the authenticated customer's profile.
    async fn update_customer(
        &self,
        token: &AuthToken,
        input: &ProfileInput,
    ) -> Result<Customer, CommerceError>;

    /// List the customer's saved addresses.
    async fn list_addresses(&self, token: &AuthToken) -> Result<Vec<Address>, CommerceError>;

    /// Save a new address; returns the refreshed customer.
    async fn create_address(
        &self,
        token: &AuthToken,
        address: &AddressPayload,
    ) -> Result<Customer, CommerceError>;

    /// Update a saved address; returns the refreshed customer.
    async fn update_address(
        &self,
        token: &AuthToken,
        address_id: &AddressId,
        address: &AddressPayload,
    ) -> Result<Customer, CommerceError>;

    /// Delete a saved address; returns the refreshed customer.
    async fn delete_address(
        &self,
        token: &AuthToken,
        address_id: &AddressId,
    ) -> Result<Customer, CommerceError>;

    /// List the customer's past orders.
    async fn list_orders(&self, token: &AuthToken) -> Result<Vec<Order>, CommerceError>;
}

/// Read-only catalog queries.
#[async_trait]
pub trait CatalogOps: Send + Sync {
    /// List all products with variant prices and categories.
    async fn list_products(&self) -> Result<Vec<Product>, CommerceError>;

    /// Fetch a single product by its URL handle.
    async fn get_product_by_handle(&self, handle: &str) -> Result<Product, CommerceError>;

    /// List all product categories.
    async fn list_categories(&self) -> Result<Vec<ProductCategory>, CommerceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("cart cart_01".to_string());
        assert_eq!(err.to_string(), "not found: cart cart_01");

        let err = CommerceError::Api {
            status: 422,
            message: "variant out of stock".to_string(),
        };
        assert_eq!(err.to_string(), "API error (422): variant out of stock");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CommerceError::RateLimited(60);
        assert_eq!(err.to_string(), "rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_is_not_found() {
        assert!(CommerceError::NotFound("x".to_string()).is_not_found());
        assert!(!CommerceError::Unauthenticated.is_not_found());
    }
}

//! Commerce backend REST client.
//!
//! Thin typed wrapper over the backend's store API using `reqwest`.
//! Catalog reads are cached with `moka` (5-minute TTL); cart, checkout,
//! and customer calls always go to the backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use jarsy_core::{
    AddressId, CartId, Email, LineItemId, PaymentProviderId, RegionId, ShippingOptionId, VariantId,
};

use crate::config::CommerceConfig;

use super::types::{
    Address, AddressPayload, AuthToken, Cart, CartCompletion, CartEnvelope, CategoriesEnvelope,
    Customer, CustomerEnvelope, Order, OrdersEnvelope, Product, ProductCategory, ProductsEnvelope,
    ProfileInput, RegisterInput, ShippingOption, ShippingOptionsEnvelope, TokenEnvelope,
};
use super::{CartOps, CatalogOps, CheckoutOps, CommerceError, CustomerOps};

/// Cache TTL for catalog responses.
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cached catalog values.
#[derive(Clone)]
enum CacheValue {
    Products(Vec<Product>),
    Product(Box<Product>),
    Categories(Vec<ProductCategory>),
}

/// Client for the commerce backend's store API.
///
/// Cheaply cloneable via `Arc`. Implements the operation traits
/// ([`CartOps`], [`CheckoutOps`], [`CustomerOps`], [`CatalogOps`]) that the
/// state containers are generic over.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    region_id: RegionId,
    cache: Cache<String, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce client.
    ///
    /// # Panics
    ///
    /// Panics if the publishable key contains invalid header characters.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-publishable-api-key",
            HeaderValue::from_str(config.publishable_key.expose_secret())
                .expect("Invalid publishable key for header"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                region_id: config.region_id.clone(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Check backend reachability (used by the readiness probe).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend health endpoint is unreachable or
    /// reports a non-success status.
    pub async fn ping(&self) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .get(self.url("/health"))
            .send()
            .await?
            .error_for_status()?;
        drop(response);
        Ok(())
    }

    /// Send a request and deserialize the response, mapping backend
    /// failure statuses onto [`CommerceError`].
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CommerceError::Unauthenticated);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(extract_message(&response_text)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: extract_message(&response_text),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }
}

/// Pull the `message` field out of an error body, falling back to a
/// truncated copy of the body itself.
fn extract_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |parsed| parsed.message,
    )
}

// =============================================================================
// Cart Operations (not cached - mutable state)
// =============================================================================

#[async_trait]
impl CartOps for CommerceClient {
    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url("/store/carts"))
            .json(&json!({ "region_id": region_id }));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .get(self.url(&format!("/store/carts/{cart_id}")));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, variant_id = %variant_id))]
    async fn add_line_item(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}/line-items")))
            .json(&json!({ "variant_id": variant_id, "quantity": quantity }));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    async fn update_line_item(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}/line-items/{line_id}")))
            .json(&json!({ "quantity": quantity }));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    async fn remove_line_item(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
    ) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("/store/carts/{cart_id}/line-items/{line_id}")));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }
}

// =============================================================================
// Checkout Operations
// =============================================================================

#[async_trait]
impl CheckoutOps for CommerceClient {
    #[instrument(skip(self, address), fields(cart_id = %cart_id))]
    async fn set_cart_details(
        &self,
        cart_id: &CartId,
        email: &Email,
        address: &AddressPayload,
    ) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}")))
            .json(&json!({ "email": email, "shipping_address": address }));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn list_shipping_options(
        &self,
        cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, CommerceError> {
        let request = self
            .inner
            .client
            .get(self.url(&format!("/store/shipping-options/{cart_id}")));

        let envelope: ShippingOptionsEnvelope = self.send(request).await?;
        Ok(envelope.shipping_options)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, option_id = %option_id))]
    async fn add_shipping_method(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}/shipping-methods")))
            .json(&json!({ "option_id": option_id }));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn create_payment_sessions(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}/payment-sessions")));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, provider_id = %provider_id))]
    async fn select_payment_session(
        &self,
        cart_id: &CartId,
        provider_id: &PaymentProviderId,
    ) -> Result<Cart, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}/payment-session")))
            .json(&json!({ "provider_id": provider_id }));

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn complete_cart(&self, cart_id: &CartId) -> Result<CartCompletion, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/carts/{cart_id}/complete")));

        // The completion response is the tagged union itself, not enveloped
        self.send(request).await
    }
}

// =============================================================================
// Customer Operations
// =============================================================================

#[async_trait]
impl CustomerOps for CommerceClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &str) -> Result<AuthToken, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url("/store/auth/token"))
            .json(&json!({ "email": email, "password": password }));

        let envelope: TokenEnvelope = self.send(request).await?;
        Ok(AuthToken::new(envelope.access_token))
    }

    #[instrument(skip(self, input))]
    async fn register(&self, input: &RegisterInput) -> Result<Customer, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url("/store/customers"))
            .json(input);

        let envelope: CustomerEnvelope = self.send(request).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, token))]
    async fn logout(&self, token: &AuthToken) -> Result<(), CommerceError> {
        let response = self
            .inner
            .client
            .delete(self.url("/store/auth"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        // 401 on logout just means the session is already gone
        if !response.status().is_success()
            && response.status() != reqwest::StatusCode::UNAUTHORIZED
        {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn current_customer(&self, token: &AuthToken) -> Result<Customer, CommerceError> {
        let request = self
            .inner
            .client
            .get(self.url("/store/customers/me"))
            .bearer_auth(token.as_str());

        let envelope: CustomerEnvelope = self.send(request).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, token, input))]
    async fn update_customer(
        &self,
        token: &AuthToken,
        input: &ProfileInput,
    ) -> Result<Customer, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url("/store/customers/me"))
            .bearer_auth(token.as_str())
            .json(input);

        let envelope: CustomerEnvelope = self.send(request).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, token))]
    async fn list_addresses(&self, token: &AuthToken) -> Result<Vec<Address>, CommerceError> {
        let customer = self.current_customer(token).await?;
        Ok(customer.shipping_addresses)
    }

    #[instrument(skip(self, token, address))]
    async fn create_address(
        &self,
        token: &AuthToken,
        address: &AddressPayload,
    ) -> Result<Customer, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url("/store/customers/me/addresses"))
            .bearer_auth(token.as_str())
            .json(&json!({ "address": address }));

        let envelope: CustomerEnvelope = self.send(request).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, token, address), fields(address_id = %address_id))]
    async fn update_address(
        &self,
        token: &AuthToken,
        address_id: &AddressId,
        address: &AddressPayload,
    ) -> Result<Customer, CommerceError> {
        let request = self
            .inner
            .client
            .post(self.url(&format!("/store/customers/me/addresses/{address_id}")))
            .bearer_auth(token.as_str())
            .json(&json!({ "address": address }));

        let envelope: CustomerEnvelope = self.send(request).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, token), fields(address_id = %address_id))]
    async fn delete_address(
        &self,
        token: &AuthToken,
        address_id: &AddressId,
    ) -> Result<Customer, CommerceError> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("/store/customers/me/addresses/{address_id}")))
            .bearer_auth(token.as_str());

        let envelope: CustomerEnvelope = self.send(request).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, token))]
    async fn list_orders(&self, token: &AuthToken) -> Result<Vec<Order>, CommerceError> {
        let request = self
            .inner
            .client
            .get(self.url("/store/customers/me/orders"))
            .bearer_auth(token.as_str());

        let envelope: OrdersEnvelope = self.send(request).await?;
        Ok(envelope.orders)
    }
}

// =============================================================================
// Catalog Operations (cached)
// =============================================================================

#[async_trait]
impl CatalogOps for CommerceClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, CommerceError> {
        let cache_key = "products:all".to_string();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let request = self
            .inner
            .client
            .get(self.url("/store/products"))
            .query(&[("region_id", self.inner.region_id.as_str())]);

        let envelope: ProductsEnvelope = self.send(request).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(envelope.products.clone()))
            .await;

        Ok(envelope.products)
    }

    #[instrument(skip(self), fields(handle = %handle))]
    async fn get_product_by_handle(&self, handle: &str) -> Result<Product, CommerceError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self
            .inner
            .client
            .get(self.url("/store/products"))
            .query(&[
                ("handle", handle),
                ("limit", "1"),
                ("region_id", self.inner.region_id.as_str()),
            ]);

        let envelope: ProductsEnvelope = self.send(request).await?;

        let product = envelope
            .products
            .into_iter()
            .next()
            .ok_or_else(|| CommerceError::NotFound(format!("product not found: {handle}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<ProductCategory>, CommerceError> {
        let cache_key = "categories:all".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.inner.client.get(self.url("/store/product-categories"));

        let envelope: CategoriesEnvelope = self.send(request).await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Categories(envelope.product_categories.clone()),
            )
            .await;

        Ok(envelope.product_categories)
    }
}

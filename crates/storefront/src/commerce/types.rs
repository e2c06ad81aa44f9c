//! Domain types for the commerce backend API.
//!
//! Explicit typed contracts for everything that crosses the backend
//! boundary. All monetary amounts are integers in minor units, reported by
//! the backend; the storefront never recomputes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jarsy_core::{
    AddressId, CartId, CustomerId, LineItemId, OrderId, PaymentProviderId, ProductId, RegionId,
    ShippingOptionId, VariantId,
};

// =============================================================================
// Cart Types
// =============================================================================

/// A shopping cart mirrored from the backend.
///
/// Exists server-side only; the storefront holds a mirror that is replaced
/// wholesale after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Region the cart was created in.
    pub region_id: Option<RegionId>,
    /// Email captured during checkout.
    pub email: Option<String>,
    /// Line items, in backend order.
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Subtotal in minor units, before shipping and tax.
    pub subtotal: Option<i64>,
    /// Shipping total in minor units.
    pub shipping_total: Option<i64>,
    /// Grand total in minor units (tax/shipping/discount adjusted).
    pub total: Option<i64>,
    /// Shipping address captured during checkout.
    pub shipping_address: Option<Address>,
    /// Selected shipping methods.
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    /// Active payment session, if one has been selected.
    pub payment_session: Option<PaymentSession>,
    /// Set once the cart has been completed into an order.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Sum of line item quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One product-variant-and-quantity entry within a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Line item ID.
    pub id: LineItemId,
    /// Display title.
    pub title: String,
    /// Thumbnail image URL.
    pub thumbnail: Option<String>,
    /// Product variant this line refers to.
    pub variant_id: Option<VariantId>,
    /// Quantity (always positive; zero triggers removal upstream).
    pub quantity: u32,
    /// Unit price in minor units.
    pub unit_price: i64,
    /// Backend-computed line total in minor units.
    pub total: Option<i64>,
}

/// A shipping method attached to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethod {
    /// Shipping method ID.
    pub id: String,
    /// The option this method was created from.
    pub shipping_option_id: Option<ShippingOptionId>,
    /// Price in minor units.
    pub price: Option<i64>,
}

/// A shipping option available for a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingOption {
    /// Shipping option ID.
    pub id: ShippingOptionId,
    /// Display name (e.g., "Standard Shipping").
    pub name: String,
    /// Price in minor units.
    pub amount: Option<i64>,
}

/// A payment session on a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Payment provider that owns the session.
    pub provider_id: PaymentProviderId,
    /// Provider-reported status.
    pub status: Option<String>,
}

/// Result of completing a cart.
///
/// The backend answers with a tagged union: `order` when payment was
/// authorized and an order was placed, `cart` when the cart still requires
/// action (e.g., payment declined).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum CartCompletion {
    /// The cart was completed into an order.
    Order(Order),
    /// The cart was returned unchanged; completion did not happen.
    Cart(Cart),
}

// =============================================================================
// Customer Types
// =============================================================================

/// The authenticated shopper record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID.
    pub id: CustomerId,
    /// Email address.
    pub email: String,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Saved shipping addresses.
    #[serde(default)]
    pub shipping_addresses: Vec<Address>,
}

/// A saved address belonging to a customer (or captured on a cart).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Address ID (absent for addresses embedded in a cart).
    pub id: Option<AddressId>,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street address.
    pub address_1: String,
    /// Additional address line.
    pub address_2: Option<String>,
    /// City.
    pub city: String,
    /// Province or state.
    pub province: Option<String>,
    /// Postal code.
    pub postal_code: String,
    /// 2-letter lowercase country code.
    pub country_code: String,
    /// Phone number.
    pub phone: Option<String>,
}

/// Address fields sent to the backend (no server-assigned ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressPayload {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street address.
    pub address_1: String,
    /// Additional address line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    /// City.
    pub city: String,
    /// Province or state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    /// Postal code.
    pub postal_code: String,
    /// 2-letter lowercase country code.
    pub country_code: String,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Fields for registering a new customer.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Plaintext password, hashed by the backend.
    pub password: String,
}

/// Fields for updating the authenticated customer's profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Bearer token issued by the backend on login.
///
/// Stored in the session; attached to customer-scoped calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// A read-only order projection.
///
/// Returned by the backend after a cart is completed; never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Human-friendly order number.
    pub display_id: Option<i64>,
    /// Backend order status (e.g., "pending", "completed").
    pub status: Option<String>,
    /// Grand total in minor units.
    pub total: Option<i64>,
    /// ISO 4217 currency code, lowercase.
    pub currency_code: Option<String>,
    /// When the order was placed.
    pub created_at: Option<DateTime<Utc>>,
    /// Line items on the order.
    #[serde(default)]
    pub items: Vec<LineItem>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A product as reported by the backend catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: Option<String>,
    /// Product title.
    pub title: Option<String>,
    /// Plain text description.
    pub description: Option<String>,
    /// Thumbnail image URL.
    pub thumbnail: Option<String>,
    /// Product images.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Product variants with prices.
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    /// Categories the product belongs to.
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    /// Collection the product belongs to.
    pub collection: Option<ProductCollection>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<ProductTag>,
}

/// A product variant with its price list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID (passed to cart mutations).
    pub id: VariantId,
    /// Variant title.
    pub title: Option<String>,
    /// Prices across currencies and price lists.
    #[serde(default)]
    pub prices: Vec<VariantPrice>,
}

/// One price entry on a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantPrice {
    /// ISO 4217 currency code, lowercase. Kept as a string because the
    /// backend may carry currencies the storefront does not sell in.
    pub currency_code: String,
    /// Amount in minor units.
    pub amount: i64,
}

/// A product image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image URL.
    pub url: String,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategory {
    /// Category ID.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
}

/// A product collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCollection {
    /// Collection title.
    pub title: Option<String>,
}

/// A free-form product tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTag {
    /// Tag value.
    pub value: String,
}

// =============================================================================
// Response Envelopes
// =============================================================================

/// `{ "cart": ... }` envelope used by all cart endpoints.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    /// The cart.
    pub cart: Cart,
}

/// `{ "customer": ... }` envelope used by customer endpoints.
#[derive(Debug, Deserialize)]
pub struct CustomerEnvelope {
    /// The customer.
    pub customer: Customer,
}

/// `{ "access_token": ... }` envelope returned on login.
#[derive(Debug, Deserialize)]
pub struct TokenEnvelope {
    /// Bearer token for subsequent customer-scoped calls.
    pub access_token: String,
}

/// `{ "shipping_options": [...] }` envelope.
#[derive(Debug, Deserialize)]
pub struct ShippingOptionsEnvelope {
    /// Available shipping options.
    pub shipping_options: Vec<ShippingOption>,
}

/// `{ "orders": [...] }` envelope.
#[derive(Debug, Deserialize)]
pub struct OrdersEnvelope {
    /// The customer's past orders.
    pub orders: Vec<Order>,
}

/// `{ "products": [...] }` envelope.
#[derive(Debug, Deserialize)]
pub struct ProductsEnvelope {
    /// Products matching the query.
    pub products: Vec<Product>,
}

/// `{ "product_categories": [...] }` envelope.
#[derive(Debug, Deserialize)]
pub struct CategoriesEnvelope {
    /// All product categories.
    pub product_categories: Vec<ProductCategory>,
}

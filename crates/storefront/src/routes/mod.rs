//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness check
//! GET    /health/ready               - Readiness check (pings the backend)
//!
//! # Catalog
//! GET    /products                   - Product listing
//! GET    /products/{handle}          - Product detail with variants
//! GET    /categories                 - Category listing
//!
//! # Cart
//! GET    /cart                       - Show (and lazily create) the cart
//! POST   /cart/items                 - Add a variant
//! POST   /cart/items/{line_id}       - Change a line's quantity
//! DELETE /cart/items/{line_id}       - Remove a line
//! POST   /cart/clear                 - Discard and start fresh
//! GET    /cart/count                 - Badge count (never fails)
//!
//! # Checkout
//! GET    /checkout                   - Current step
//! POST   /checkout/address           - Submit email + shipping address
//! GET    /checkout/shipping-options  - Options for the cart
//! POST   /checkout/shipping          - Pick an option, prepare payment
//! POST   /checkout/complete          - Place the order
//!
//! # Auth
//! POST   /auth/login                 - Login action
//! POST   /auth/register              - Register action
//! POST   /auth/logout                - Logout action
//! GET    /auth/session               - Current customer or null
//!
//! # Account (requires auth)
//! GET    /account                    - Profile
//! POST   /account                    - Update profile
//! GET    /account/addresses          - Address list
//! POST   /account/addresses          - Save address
//! POST   /account/addresses/{id}     - Update address
//! DELETE /account/addresses/{id}     - Delete address
//! GET    /account/orders             - Order history
//!
//! # Suggestions
//! POST   /suggest                    - AI listing copy (503 if unconfigured)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod suggest;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route(
            "/items/{line_id}",
            post(cart::update).delete(cart::remove),
        )
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", post(checkout::address))
        .route("/shipping-options", get(checkout::shipping_options))
        .route("/shipping", post(checkout::shipping))
        .route("/complete", post(checkout::complete))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).post(account::update))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            post(account::update_address).delete(account::delete_address),
        )
        .route("/orders", get(account::orders))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .route("/suggest", post(suggest::generate))
}

//! Session-related types.
//!
//! The session carries three pieces of state per shopper: the active cart
//! ID, the bearer token when logged in, and the checkout step an
//! in-progress checkout is at.

/// Session keys.
pub mod keys {
    /// Key for storing the active cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the customer bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Key for the persisted checkout step.
    pub const CHECKOUT_STEP: &str = "checkout_step";
}

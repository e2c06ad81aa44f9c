//! Session layer configuration.
//!
//! Sessions are held in memory; the only state they carry is the cart ID,
//! the auth token, and the checkout step, all of which the shopper can
//! recover from the backend after a restart.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

const SESSION_COOKIE_NAME: &str = "jarsy_session";
const SESSION_LIFETIME_DAYS: i64 = 30;

/// Create the session management layer.
#[must_use]
pub fn create_session_layer() -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        // TLS terminates at the proxy
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_LIFETIME_DAYS)))
}

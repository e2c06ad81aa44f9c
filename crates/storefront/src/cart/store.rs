//! Persistence of the active cart ID.
//!
//! The cart itself lives on the backend; the only thing the storefront
//! persists per shopper is the ID of their active cart. The session-backed
//! store is used in production; the in-memory store exists for tests.

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

use jarsy_core::CartId;

use crate::models::session::keys::CART_ID;

/// Errors from the cart ID store.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The underlying session store failed.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Where the active cart ID is kept between requests.
#[async_trait]
pub trait CartIdStore: Send + Sync {
    /// Load the stored cart ID, if any.
    async fn load(&self) -> Result<Option<CartId>, CartStoreError>;

    /// Persist the cart ID.
    async fn save(&self, cart_id: &CartId) -> Result<(), CartStoreError>;

    /// Forget the stored cart ID.
    async fn clear(&self) -> Result<(), CartStoreError>;
}

#[async_trait]
impl<T: CartIdStore + ?Sized> CartIdStore for std::sync::Arc<T> {
    async fn load(&self) -> Result<Option<CartId>, CartStoreError> {
        (**self).load().await
    }

    async fn save(&self, cart_id: &CartId) -> Result<(), CartStoreError> {
        (**self).save(cart_id).await
    }

    async fn clear(&self) -> Result<(), CartStoreError> {
        (**self).clear().await
    }
}

/// Cart ID store backed by the shopper's `tower-sessions` session.
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    /// Wrap the request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CartIdStore for SessionCartStore {
    async fn load(&self) -> Result<Option<CartId>, CartStoreError> {
        Ok(self.session.get::<CartId>(CART_ID).await?)
    }

    async fn save(&self, cart_id: &CartId) -> Result<(), CartStoreError> {
        self.session.insert(CART_ID, cart_id).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CartStoreError> {
        self.session.remove::<CartId>(CART_ID).await?;
        Ok(())
    }
}

/// In-memory cart ID store for tests.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    slot: tokio::sync::Mutex<Option<CartId>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartIdStore for MemoryCartStore {
    async fn load(&self) -> Result<Option<CartId>, CartStoreError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, cart_id: &CartId) -> Result<(), CartStoreError> {
        *self.slot.lock().await = Some(cart_id.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CartStoreError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

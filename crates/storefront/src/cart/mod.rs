//! Cart synchronization container.
//!
//! Owns the local mirror of a server-side cart plus the queue of shopper
//! notices produced by cart activity. The backend is the source of truth:
//! every mutation round-trips to the backend and replaces the mirror
//! wholesale with the response. Mutations are serialized through a single
//! async lock, so two overlapping calls can never interleave their
//! round-trips.

pub mod store;

pub use store::{CartIdStore, CartStoreError, MemoryCartStore, SessionCartStore};

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use jarsy_core::{CurrencyCode, LineItemId, Price, RegionId, VariantId};

use crate::commerce::{Cart, CartOps, CommerceError};

/// Errors from cart container operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The commerce backend rejected or failed the call.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// The cart ID could not be loaded or persisted.
    #[error(transparent)]
    Store(#[from] CartStoreError),
}

/// Severity of a shopper-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

/// A short shopper-facing message queued by cart activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Display text.
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Default)]
struct CartState {
    cart: Option<Cart>,
    notices: Vec<Notice>,
}

/// Synchronizes a server-side cart with a local mirror.
///
/// Generic over the backend ([`CartOps`]) and the cart ID store
/// ([`CartIdStore`]) so it can be exercised against in-memory fakes.
pub struct CartContainer<B, S> {
    backend: B,
    store: S,
    region_id: RegionId,
    currency: CurrencyCode,
    state: Mutex<CartState>,
    loading: AtomicBool,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<B, S> CartContainer<B, S>
where
    B: CartOps,
    S: CartIdStore,
{
    /// Create a container with no cart loaded yet.
    pub fn new(backend: B, store: S, region_id: RegionId, currency: CurrencyCode) -> Self {
        Self {
            backend,
            store,
            region_id,
            currency,
            state: Mutex::new(CartState::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Whether a backend round-trip is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn mark_loading(&self) -> LoadingGuard<'_> {
        self.loading.store(true, Ordering::SeqCst);
        LoadingGuard(&self.loading)
    }

    /// Load the active cart, creating one when necessary.
    ///
    /// A stored cart ID that no longer resolves (expired or already
    /// completed) is silently replaced with a fresh cart. This is the only
    /// automatic recovery the container performs.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails for any reason other
    /// than the stored cart being gone, or if the ID store fails.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Cart, CartError> {
        let mut state = self.state.lock().await;
        let _busy = self.mark_loading();
        self.ensure_cart(&mut state).await
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the mutation; an error
    /// notice is queued in that case.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_item(
        &self,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let mut state = self.state.lock().await;
        let _busy = self.mark_loading();
        let current = self.ensure_cart(&mut state).await?;

        match self
            .backend
            .add_line_item(&current.id, variant_id, quantity)
            .await
        {
            Ok(cart) => {
                state.cart = Some(cart.clone());
                state.notices.push(Notice::success("Item added to cart"));
                Ok(cart)
            }
            Err(e) => {
                state.notices.push(Notice::error("Could not add item to cart"));
                Err(e.into())
            }
        }
    }

    /// Set the quantity of a line item.
    ///
    /// A quantity of zero or below removes the line instead; the backend
    /// rejects non-positive quantities on its update endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the mutation.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(
        &self,
        line_id: &LineItemId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let mut state = self.state.lock().await;
        let _busy = self.mark_loading();

        if quantity <= 0 {
            return self.remove_locked(&mut state, line_id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let current = self.ensure_cart(&mut state).await?;
        match self
            .backend
            .update_line_item(&current.id, line_id, quantity)
            .await
        {
            Ok(cart) => {
                state.cart = Some(cart.clone());
                Ok(cart)
            }
            Err(e) => {
                state
                    .notices
                    .push(Notice::error("Could not update quantity"));
                Err(e.into())
            }
        }
    }

    /// Remove a line item from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no active cart or the backend rejects
    /// the mutation; an error notice is queued either way.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &LineItemId) -> Result<Cart, CartError> {
        let mut state = self.state.lock().await;
        let _busy = self.mark_loading();
        self.remove_locked(&mut state, line_id).await
    }

    /// Discard the current cart and start a fresh one.
    ///
    /// Used after a completed checkout and by the explicit "empty my cart"
    /// action. The old cart is abandoned on the backend, never mutated.
    ///
    /// # Errors
    ///
    /// Returns an error if the fresh cart cannot be created or its ID not
    /// persisted.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, CartError> {
        let mut state = self.state.lock().await;
        let _busy = self.mark_loading();

        self.store.clear().await?;
        let cart = self.backend.create_cart(&self.region_id).await?;
        self.store.save(&cart.id).await?;
        state.cart = Some(cart.clone());
        Ok(cart)
    }

    /// Re-fetch the cart from the backend, replacing the mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the ID store fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart, CartError> {
        let mut state = self.state.lock().await;
        let _busy = self.mark_loading();
        state.cart = None;
        self.ensure_cart(&mut state).await
    }

    /// A copy of the current mirror, if a cart has been loaded.
    pub async fn snapshot(&self) -> Option<Cart> {
        self.state.lock().await.cart.clone()
    }

    /// The backend-computed grand total, verbatim.
    pub async fn total_price(&self) -> Option<Price> {
        let state = self.state.lock().await;
        state
            .cart
            .as_ref()
            .and_then(|cart| cart.total)
            .map(|total| Price::new(total, self.currency))
    }

    /// Sum of line item quantities in the mirror.
    pub async fn item_count(&self) -> u32 {
        let state = self.state.lock().await;
        state.cart.as_ref().map_or(0, Cart::item_count)
    }

    /// Drain the queued notices. Each notice is delivered exactly once.
    pub async fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state.lock().await.notices)
    }

    /// Removal requires an active cart; unlike adds, it never creates one.
    async fn remove_locked(
        &self,
        state: &mut CartState,
        line_id: &LineItemId,
    ) -> Result<Cart, CartError> {
        let cart_id = match &state.cart {
            Some(cart) => cart.id.clone(),
            None => match self.store.load().await? {
                Some(id) => id,
                None => {
                    state.notices.push(Notice::error("No active cart"));
                    return Err(CommerceError::NotFound("no active cart".to_string()).into());
                }
            },
        };

        match self.backend.remove_line_item(&cart_id, line_id).await {
            Ok(cart) => {
                state.cart = Some(cart.clone());
                state.notices.push(Notice::success("Item removed from cart"));
                Ok(cart)
            }
            Err(e) => {
                state
                    .notices
                    .push(Notice::error("Could not remove item from cart"));
                Err(e.into())
            }
        }
    }

    /// Resolve the active cart into the mirror, creating one if the stored
    /// ID is absent, stale, or points at a completed cart.
    async fn ensure_cart(&self, state: &mut CartState) -> Result<Cart, CartError> {
        if let Some(cart) = &state.cart {
            return Ok(cart.clone());
        }

        let cart = match self.store.load().await? {
            Some(id) => match self.backend.get_cart(&id).await {
                Ok(cart) if cart.completed_at.is_none() => cart,
                Ok(_) => self.backend.create_cart(&self.region_id).await?,
                Err(e) if e.is_not_found() => {
                    warn!(cart_id = %id, "Stored cart no longer exists, creating a new one");
                    self.backend.create_cart(&self.region_id).await?
                }
                Err(e) => return Err(e.into()),
            },
            None => self.backend.create_cart(&self.region_id).await?,
        };

        self.store.save(&cart.id).await?;
        state.cart = Some(cart.clone());
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU64;

    use async_trait::async_trait;

    use jarsy_core::CartId;

    use crate::commerce::LineItem;

    use super::*;

    /// In-memory cart backend that mimics the real API's behavior.
    #[derive(Default)]
    struct FakeBackend {
        carts: Mutex<HashMap<CartId, Cart>>,
        next_id: AtomicU64,
        fail_next: AtomicBool,
    }

    impl FakeBackend {
        fn blank_cart(id: CartId) -> Cart {
            Cart {
                id,
                region_id: Some(RegionId::new("reg_in")),
                email: None,
                items: Vec::new(),
                subtotal: Some(0),
                shipping_total: None,
                total: Some(0),
                shipping_address: None,
                shipping_methods: Vec::new(),
                payment_session: None,
                completed_at: None,
            }
        }

        fn recompute(cart: &mut Cart) {
            let subtotal: i64 = cart
                .items
                .iter()
                .map(|item| item.unit_price * i64::from(item.quantity))
                .sum();
            cart.subtotal = Some(subtotal);
            cart.total = Some(subtotal + cart.shipping_total.unwrap_or(0));
        }

        async fn check_failure(&self) -> Result<(), CommerceError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(CommerceError::Api {
                    status: 500,
                    message: "induced failure".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CartOps for FakeBackend {
        async fn create_cart(&self, _region_id: &RegionId) -> Result<Cart, CommerceError> {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            let cart = Self::blank_cart(CartId::new(format!("cart_{n}")));
            self.carts
                .lock()
                .await
                .insert(cart.id.clone(), cart.clone());
            Ok(cart)
        }

        async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
            self.carts
                .lock()
                .await
                .get(cart_id)
                .cloned()
                .ok_or_else(|| CommerceError::NotFound(format!("cart {cart_id}")))
        }

        async fn add_line_item(
            &self,
            cart_id: &CartId,
            variant_id: &VariantId,
            quantity: u32,
        ) -> Result<Cart, CommerceError> {
            self.check_failure().await?;
            let mut carts = self.carts.lock().await;
            let cart = carts
                .get_mut(cart_id)
                .ok_or_else(|| CommerceError::NotFound(format!("cart {cart_id}")))?;
            if let Some(item) = cart
                .items
                .iter_mut()
                .find(|item| item.variant_id.as_ref() == Some(variant_id))
            {
                item.quantity += quantity;
            } else {
                cart.items.push(LineItem {
                    id: LineItemId::new(format!("item_{}", cart.items.len())),
                    title: "Test item".to_string(),
                    thumbnail: None,
                    variant_id: Some(variant_id.clone()),
                    quantity,
                    unit_price: 500,
                    total: None,
                });
            }
            Self::recompute(cart);
            Ok(cart.clone())
        }

        async fn update_line_item(
            &self,
            cart_id: &CartId,
            line_id: &LineItemId,
            quantity: u32,
        ) -> Result<Cart, CommerceError> {
            self.check_failure().await?;
            let mut carts = self.carts.lock().await;
            let cart = carts
                .get_mut(cart_id)
                .ok_or_else(|| CommerceError::NotFound(format!("cart {cart_id}")))?;
            let item = cart
                .items
                .iter_mut()
                .find(|item| &item.id == line_id)
                .ok_or_else(|| CommerceError::NotFound(format!("line {line_id}")))?;
            item.quantity = quantity;
            Self::recompute(cart);
            Ok(cart.clone())
        }

        async fn remove_line_item(
            &self,
            cart_id: &CartId,
            line_id: &LineItemId,
        ) -> Result<Cart, CommerceError> {
            self.check_failure().await?;
            let mut carts = self.carts.lock().await;
            let cart = carts
                .get_mut(cart_id)
                .ok_or_else(|| CommerceError::NotFound(format!("cart {cart_id}")))?;
            cart.items.retain(|item| &item.id != line_id);
            Self::recompute(cart);
            Ok(cart.clone())
        }
    }

    fn container(backend: FakeBackend) -> CartContainer<FakeBackend, MemoryCartStore> {
        CartContainer::new(
            backend,
            MemoryCartStore::new(),
            RegionId::new("reg_in"),
            CurrencyCode::Inr,
        )
    }

    #[tokio::test]
    async fn test_initialize_creates_cart_when_none_stored() {
        let container = container(FakeBackend::default());
        let cart = container.initialize().await.unwrap();
        assert!(cart.items.is_empty());

        // The ID is persisted, so a second call resolves the same cart
        let again = container.initialize().await.unwrap();
        assert_eq!(again.id, cart.id);
    }

    #[tokio::test]
    async fn test_stale_cart_id_is_replaced_with_fresh_cart() {
        let backend = FakeBackend::default();
        let store = MemoryCartStore::new();
        store.save(&CartId::new("cart_gone")).await.unwrap();

        let container = CartContainer::new(
            backend,
            store,
            RegionId::new("reg_in"),
            CurrencyCode::Inr,
        );
        let cart = container.initialize().await.unwrap();
        assert_ne!(cart.id.as_str(), "cart_gone");
    }

    #[tokio::test]
    async fn test_add_item_updates_mirror_and_queues_notice() {
        let container = container(FakeBackend::default());
        let cart = container
            .add_item(&VariantId::new("variant_a"), 2)
            .await
            .unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(container.item_count().await, 2);
        assert_eq!(
            container.take_notices().await,
            vec![Notice::success("Item added to cart")]
        );
        // Notices are delivered exactly once
        assert!(container.take_notices().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes_line() {
        let container = container(FakeBackend::default());
        let cart = container
            .add_item(&VariantId::new("variant_a"), 1)
            .await
            .unwrap();
        let line_id = cart.items[0].id.clone();

        let cart = container.update_quantity(&line_id, 0).await.unwrap();
        assert!(cart.items.is_empty());

        let notices = container.take_notices().await;
        assert_eq!(notices[1], Notice::success("Item removed from cart"));
    }

    #[tokio::test]
    async fn test_remove_without_active_cart_is_rejected() {
        let container = container(FakeBackend::default());
        let result = container.remove_item(&LineItemId::new("item_0")).await;

        assert!(result.is_err());
        assert_eq!(
            container.take_notices().await,
            vec![Notice::error("No active cart")]
        );
        // No cart was created as a side effect
        assert!(container.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_update_quantity_positive_sets_quantity() {
        let container = container(FakeBackend::default());
        let cart = container
            .add_item(&VariantId::new("variant_a"), 1)
            .await
            .unwrap();
        let line_id = cart.items[0].id.clone();

        let cart = container.update_quantity(&line_id, 5).await.unwrap();
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_total_price_is_backend_total_verbatim() {
        let container = container(FakeBackend::default());
        container
            .add_item(&VariantId::new("variant_a"), 3)
            .await
            .unwrap();

        // 3 x 500 minor units, straight from the fake backend's arithmetic
        let total = container.total_price().await.unwrap();
        assert_eq!(total, Price::new(1500, CurrencyCode::Inr));
        assert_eq!(total.display(), "₹15.00");
    }

    #[tokio::test]
    async fn test_clear_discards_id_and_creates_fresh_cart() {
        let container = container(FakeBackend::default());
        let first = container
            .add_item(&VariantId::new("variant_a"), 1)
            .await
            .unwrap();

        let fresh = container.clear().await.unwrap();
        assert_ne!(fresh.id, first.id);
        assert!(fresh.items.is_empty());
        assert_eq!(container.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_mirror_and_queues_error() {
        let backend = FakeBackend::default();
        let container = container(backend);
        container
            .add_item(&VariantId::new("variant_a"), 1)
            .await
            .unwrap();
        container.take_notices().await;

        container.backend.fail_next.store(true, Ordering::SeqCst);
        let result = container.add_item(&VariantId::new("variant_b"), 1).await;
        assert!(result.is_err());

        // Mirror still reflects the last successful state
        assert_eq!(container.item_count().await, 1);
        assert_eq!(
            container.take_notices().await,
            vec![Notice::error("Could not add item to cart")]
        );
    }

    #[tokio::test]
    async fn test_completed_cart_is_not_resumed() {
        let backend = FakeBackend::default();
        let store = MemoryCartStore::new();

        let done = {
            let mut cart = FakeBackend::blank_cart(CartId::new("cart_done"));
            cart.completed_at = Some(chrono::Utc::now());
            cart
        };
        backend
            .carts
            .lock()
            .await
            .insert(done.id.clone(), done.clone());
        store.save(&done.id).await.unwrap();

        let container = CartContainer::new(
            backend,
            store,
            RegionId::new("reg_in"),
            CurrencyCode::Inr,
        );
        let cart = container.initialize().await.unwrap();
        assert_ne!(cart.id, done.id);
    }
}

//! End-to-end shopping flows against an in-memory commerce backend.
//!
//! These exercise the cart container and checkout sequencer together the
//! way the route handlers drive them: a fresh container per "request"
//! sharing one cart ID store per shopper.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use jarsy_core::{
    CartId, CurrencyCode, Email, LineItemId, OrderId, PaymentProviderId, RegionId,
    ShippingOptionId, VariantId,
};
use jarsy_storefront::cart::{CartContainer, CartIdStore, MemoryCartStore};
use jarsy_storefront::checkout::{CheckoutError, CheckoutSequencer, CheckoutStep};
use jarsy_storefront::commerce::{
    Address, AddressPayload, Cart, CartCompletion, CartOps, CheckoutOps, CommerceError, LineItem,
    Order, PaymentSession, ShippingMethod, ShippingOption,
};

const UNIT_PRICE: i64 = 45000;
const SHIPPING_PRICE: i64 = 5000;

#[derive(Default)]
struct BackendState {
    carts: HashMap<CartId, Cart>,
    next_id: u64,
}

/// In-memory stand-in for the commerce backend's store API.
#[derive(Clone, Default)]
struct InMemoryCommerce {
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryCommerce {
    fn blank_cart(id: CartId, region_id: &RegionId) -> Cart {
        Cart {
            id,
            region_id: Some(region_id.clone()),
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

    async fn with_cart<T>(
        &self,
        cart_id: &CartId,
        f: impl FnOnce(&mut Cart) -> T,
    ) -> Result<T, CommerceError> {
        let mut state = self.state.lock().await;
        let cart = state
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| CommerceError::NotFound(format!("cart {cart_id}")))?;
        Ok(f(cart))
    }
}

#[async_trait]
impl CartOps for InMemoryCommerce {
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, CommerceError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let cart = Self::blank_cart(CartId::new(format!("cart_{}", state.next_id)), region_id);
        state.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| cart.clone()).await
    }

    async fn add_line_item(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| {
            if let Some(item) = cart
                .items
                .iter_mut()
                .find(|item| item.variant_id.as_ref() == Some(variant_id))
            {
                item.quantity += quantity;
            } else {
                cart.items.push(LineItem {
                    id: LineItemId::new(format!("item_{}", cart.items.len())),
                    title: format!("Variant {variant_id}"),
                    thumbnail: None,
                    variant_id: Some(variant_id.clone()),
                    quantity,
                    unit_price: UNIT_PRICE,
                    total: None,
                });
            }
            Self::recompute(cart);
            cart.clone()
        })
        .await
    }

    async fn update_line_item(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| {
            if let Some(item) = cart.items.iter_mut().find(|item| &item.id == line_id) {
                item.quantity = quantity;
            }
            Self::recompute(cart);
            cart.clone()
        })
        .await
    }

    async fn remove_line_item(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
    ) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| {
            cart.items.retain(|item| &item.id != line_id);
            Self::recompute(cart);
            cart.clone()
        })
        .await
    }
}

#[async_trait]
impl CheckoutOps for InMemoryCommerce {
    async fn set_cart_details(
        &self,
        cart_id: &CartId,
        email: &Email,
        address: &AddressPayload,
    ) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| {
            cart.email = Some(email.to_string());
            cart.shipping_address = Some(Address {
                id: None,
                first_name: address.first_name.clone(),
                last_name: address.last_name.clone(),
                address_1: address.address_1.clone(),
                address_2: address.address_2.clone(),
                city: address.city.clone(),
                province: address.province.clone(),
                postal_code: address.postal_code.clone(),
                country_code: address.country_code.clone(),
                phone: address.phone.clone(),
            });
            cart.clone()
        })
        .await
    }

    async fn list_shipping_options(
        &self,
        _cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, CommerceError> {
        Ok(vec![
            ShippingOption {
                id: ShippingOptionId::new("so_standard"),
                name: "Standard Shipping".to_string(),
                amount: Some(SHIPPING_PRICE),
            },
            ShippingOption {
                id: ShippingOptionId::new("so_express"),
                name: "Express Shipping".to_string(),
                amount: Some(SHIPPING_PRICE * 3),
            },
        ])
    }

    async fn add_shipping_method(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| {
            cart.shipping_total = Some(SHIPPING_PRICE);
            cart.shipping_methods.push(ShippingMethod {
                id: format!("sm_{option_id}"),
                shipping_option_id: Some(option_id.clone()),
                price: Some(SHIPPING_PRICE),
            });
            Self::recompute(cart);
            cart.clone()
        })
        .await
    }

    async fn create_payment_sessions(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| cart.clone()).await
    }

    async fn select_payment_session(
        &self,
        cart_id: &CartId,
        provider_id: &PaymentProviderId,
    ) -> Result<Cart, CommerceError> {
        self.with_cart(cart_id, |cart| {
            cart.payment_session = Some(PaymentSession {
                provider_id: provider_id.clone(),
                status: Some("pending".to_string()),
            });
            cart.clone()
        })
        .await
    }

    async fn complete_cart(&self, cart_id: &CartId) -> Result<CartCompletion, CommerceError> {
        self.with_cart(cart_id, |cart| {
            if cart.payment_session.is_none() {
                return CartCompletion::Cart(cart.clone());
            }
            cart.completed_at = Some(Utc::now());
            CartCompletion::Order(Order {
                id: OrderId::new(format!("order_for_{}", cart.id)),
                display_id: Some(1),
                status: Some("pending".to_string()),
                total: cart.total,
                currency_code: Some("inr".to_string()),
                created_at: cart.completed_at,
                items: cart.items.clone(),
            })
        })
        .await
    }
}

fn region() -> RegionId {
    RegionId::new("reg_in")
}

fn container(
    backend: InMemoryCommerce,
    store: Arc<MemoryCartStore>,
) -> CartContainer<InMemoryCommerce, Arc<MemoryCartStore>> {
    CartContainer::new(backend, store, region(), CurrencyCode::Inr)
}

fn address() -> AddressPayload {
    AddressPayload {
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        address_1: "12 MG Road".to_string(),
        address_2: None,
        city: "Bengaluru".to_string(),
        province: Some("KA".to_string()),
        postal_code: "560001".to_string(),
        country_code: "in".to_string(),
        phone: None,
    }
}

#[tokio::test]
async fn cart_persists_across_requests() {
    let backend = InMemoryCommerce::default();
    let store = Arc::new(MemoryCartStore::new());

    // First "request": add two of one variant
    let first = container(backend.clone(), Arc::clone(&store));
    let cart = first
        .add_item(&VariantId::new("variant_amber"), 2)
        .await
        .expect("add");
    let cart_id = cart.id.clone();

    // Second "request": a fresh container resolves the same cart
    let second = container(backend, store);
    let resumed = second.initialize().await.expect("resume");
    assert_eq!(resumed.id, cart_id);
    assert_eq!(second.item_count().await, 2);
}

#[tokio::test]
async fn full_checkout_places_order_and_starts_fresh_cart() {
    let backend = InMemoryCommerce::default();
    let store = Arc::new(MemoryCartStore::new());

    let cart_container = container(backend.clone(), Arc::clone(&store));
    let cart = cart_container
        .add_item(&VariantId::new("variant_amber"), 2)
        .await
        .expect("add");

    let seq = CheckoutSequencer::new(backend.clone(), PaymentProviderId::new("manual"));
    let email: Email = "asha@example.com".parse().expect("email");

    seq.submit_address(&cart.id, &email, &address())
        .await
        .expect("address");
    let options = seq.shipping_options(&cart.id).await.expect("options");
    seq.submit_shipping(&cart.id, &options[0].id)
        .await
        .expect("shipping");
    let order = seq.complete(&cart.id).await.expect("complete");

    // Order total is the backend's figure: items plus shipping
    assert_eq!(order.total, Some(2 * UNIT_PRICE + SHIPPING_PRICE));
    assert_eq!(seq.current_step().await, CheckoutStep::Address);

    // The completed cart is never resumed; the next request starts fresh
    let next_request = container(backend, store);
    let fresh = next_request.initialize().await.expect("fresh");
    assert_ne!(fresh.id, cart.id);
    assert!(fresh.items.is_empty());
}

#[tokio::test]
async fn completion_without_payment_returns_cart_unchanged() {
    let backend = InMemoryCommerce::default();
    let store = Arc::new(MemoryCartStore::new());

    let cart_container = container(backend.clone(), Arc::clone(&store));
    let cart = cart_container
        .add_item(&VariantId::new("variant_amber"), 1)
        .await
        .expect("add");

    // Resume directly at the payment step without preparing payment
    let seq = CheckoutSequencer::resume(
        backend,
        PaymentProviderId::new("manual"),
        CheckoutStep::Payment,
    );
    let result = seq.complete(&cart.id).await;

    match result {
        Err(CheckoutError::NotCompleted(returned)) => assert_eq!(returned.id, cart.id),
        other => panic!("expected NotCompleted, got {other:?}"),
    }
    assert_eq!(seq.current_step().await, CheckoutStep::Payment);
}

#[tokio::test]
async fn concurrent_mutations_are_serialized() {
    let backend = InMemoryCommerce::default();
    let store = Arc::new(MemoryCartStore::new());
    let cart_container = Arc::new(container(backend, store));

    cart_container.initialize().await.expect("init");

    let a = {
        let c = Arc::clone(&cart_container);
        tokio::spawn(async move { c.add_item(&VariantId::new("variant_amber"), 2).await })
    };
    let b = {
        let c = Arc::clone(&cart_container);
        tokio::spawn(async move { c.add_item(&VariantId::new("variant_olive"), 3).await })
    };

    a.await.expect("join").expect("add a");
    b.await.expect("join").expect("add b");

    // Both round-trips landed on the same cart, nothing lost
    assert_eq!(cart_container.item_count().await, 5);
    let cart = cart_container.snapshot().await.expect("snapshot");
    assert_eq!(cart.items.len(), 2);
}

#[tokio::test]
async fn expired_cart_id_recovers_with_new_cart() {
    let backend = InMemoryCommerce::default();
    let store = Arc::new(MemoryCartStore::new());
    store
        .save(&CartId::new("cart_expired"))
        .await
        .expect("seed");

    let cart_container = container(backend, Arc::clone(&store));
    let cart = cart_container.initialize().await.expect("recover");

    assert_ne!(cart.id.as_str(), "cart_expired");
    // The replacement ID is persisted for the next request
    let stored = store.load().await.expect("load");
    assert_eq!(stored, Some(cart.id));
}

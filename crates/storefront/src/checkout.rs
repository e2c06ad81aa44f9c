//! Checkout sequencer.
//!
//! Drives a cart through the fixed checkout progression: address, then
//! shipping, then payment, then completion. Steps only ever advance in
//! order and only on success; a failed call leaves the sequencer where it
//! was. The current step is persisted in the HTTP session so an
//! interrupted checkout resumes where it stopped.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use jarsy_core::{CartId, Email, PaymentProviderId, ShippingOptionId};

use crate::commerce::{
    AddressPayload, Cart, CartCompletion, CheckoutOps, CommerceError, Order, ShippingOption,
};

/// Errors from checkout sequencing.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// An operation was attempted out of order.
    #[error("checkout step mismatch: expected {expected}, currently at {actual}")]
    WrongStep {
        /// The step the operation belongs to.
        expected: CheckoutStep,
        /// The step the sequencer is actually at.
        actual: CheckoutStep,
    },

    /// Completion ran but payment did not authorize; the cart is returned
    /// unchanged and the sequencer stays at the payment step.
    #[error("payment was not authorized, cart requires further action")]
    NotCompleted(Box<Cart>),

    /// The commerce backend rejected or failed the call.
    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

/// The step of checkout a cart is currently at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    /// Collecting the contact email and shipping address.
    Address,
    /// Choosing a shipping option.
    Shipping,
    /// Confirming the payment provider and placing the order.
    Payment,
}

impl core::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Address => "address",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
        };
        write!(f, "{name}")
    }
}

/// Sequences checkout operations against the backend.
///
/// Generic over [`CheckoutOps`] so the progression rules can be tested
/// against an in-memory fake.
pub struct CheckoutSequencer<B> {
    backend: B,
    provider: PaymentProviderId,
    step: Mutex<CheckoutStep>,
}

impl<B> CheckoutSequencer<B>
where
    B: CheckoutOps,
{
    /// Start a fresh checkout at the address step.
    pub const fn new(backend: B, provider: PaymentProviderId) -> Self {
        Self::resume(backend, provider, CheckoutStep::Address)
    }

    /// Resume a checkout at a previously persisted step.
    pub const fn resume(backend: B, provider: PaymentProviderId, step: CheckoutStep) -> Self {
        Self {
            backend,
            provider,
            step: Mutex::const_new(step),
        }
    }

    /// The step the sequencer is currently at.
    pub async fn current_step(&self) -> CheckoutStep {
        *self.step.lock().await
    }

    /// Submit the contact email and shipping address, advancing to the
    /// shipping step.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckoutError::WrongStep`] when the checkout is not at
    /// the address step, or with the backend's error.
    #[instrument(skip(self, address), fields(cart_id = %cart_id))]
    pub async fn submit_address(
        &self,
        cart_id: &CartId,
        email: &Email,
        address: &AddressPayload,
    ) -> Result<Cart, CheckoutError> {
        let mut step = self.step.lock().await;
        Self::expect_step(CheckoutStep::Address, *step)?;

        let cart = self.backend.set_cart_details(cart_id, email, address).await?;
        *step = CheckoutStep::Shipping;
        Ok(cart)
    }

    /// List the shipping options available to pick from.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckoutError::WrongStep`] before the address has been
    /// submitted, or with the backend's error.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn shipping_options(
        &self,
        cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, CheckoutError> {
        let step = self.step.lock().await;
        Self::expect_step(CheckoutStep::Shipping, *step)?;

        Ok(self.backend.list_shipping_options(cart_id).await?)
    }

    /// Attach the chosen shipping option and prepare payment, advancing to
    /// the payment step.
    ///
    /// Payment sessions are initialized and the configured provider is
    /// selected in the same motion; the shopper never picks a provider.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckoutError::WrongStep`] when the checkout is not at
    /// the shipping step, or with the backend's error.
    #[instrument(skip(self), fields(cart_id = %cart_id, option_id = %option_id))]
    pub async fn submit_shipping(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, CheckoutError> {
        let mut step = self.step.lock().await;
        Self::expect_step(CheckoutStep::Shipping, *step)?;

        self.backend.add_shipping_method(cart_id, option_id).await?;
        self.backend.create_payment_sessions(cart_id).await?;
        let cart = self
            .backend
            .select_payment_session(cart_id, &self.provider)
            .await?;

        *step = CheckoutStep::Payment;
        Ok(cart)
    }

    /// Complete the cart, placing the order.
    ///
    /// On success the sequencer resets to the address step, ready for the
    /// shopper's next cart.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckoutError::WrongStep`] before payment is prepared,
    /// [`CheckoutError::NotCompleted`] when the payment provider declined,
    /// or with the backend's error.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn complete(&self, cart_id: &CartId) -> Result<Order, CheckoutError> {
        let mut step = self.step.lock().await;
        Self::expect_step(CheckoutStep::Payment, *step)?;

        match self.backend.complete_cart(cart_id).await? {
            CartCompletion::Order(order) => {
                info!(order_id = %order.id, "Order placed");
                *step = CheckoutStep::Address;
                Ok(order)
            }
            CartCompletion::Cart(cart) => Err(CheckoutError::NotCompleted(Box::new(cart))),
        }
    }

    const fn expect_step(
        expected: CheckoutStep,
        actual: CheckoutStep,
    ) -> Result<(), CheckoutError> {
        if matches!(
            (expected, actual),
            (CheckoutStep::Address, CheckoutStep::Address)
                | (CheckoutStep::Shipping, CheckoutStep::Shipping)
                | (CheckoutStep::Payment, CheckoutStep::Payment)
        ) {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep { expected, actual })
        }
    }
}

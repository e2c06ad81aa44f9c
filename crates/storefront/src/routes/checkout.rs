//! Checkout route handlers.
//!
//! The sequencer's current step is persisted in the session between
//! requests, so an interrupted checkout resumes at the step it stopped at.
//! Completing an order discards the cart and resets the step.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use jarsy_core::{CartId, ShippingOptionId};

use crate::cart::CartIdStore;
use crate::checkout::{CheckoutSequencer, CheckoutStep};
use crate::commerce::{Cart, CommerceClient, Order, ShippingOption};
use crate::error::{AppError, Result};
use crate::models::forms::CheckoutAddressForm;
use crate::models::session::keys;
use crate::routes::cart::container;
use crate::state::AppState;

/// Response carrying the cart and the step checkout advanced to.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// The refreshed cart.
    pub cart: Cart,
    /// The step the checkout is now at.
    pub step: CheckoutStep,
}

/// Body for picking a shipping option.
#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    /// The chosen shipping option.
    pub option_id: String,
}

async fn load_step(session: &Session) -> Result<CheckoutStep> {
    Ok(session
        .get::<CheckoutStep>(keys::CHECKOUT_STEP)
        .await?
        .unwrap_or(CheckoutStep::Address))
}

async fn save_step(session: &Session, step: CheckoutStep) -> Result<()> {
    session.insert(keys::CHECKOUT_STEP, step).await?;
    Ok(())
}

async fn clear_step(session: &Session) -> Result<()> {
    session.remove::<CheckoutStep>(keys::CHECKOUT_STEP).await?;
    Ok(())
}

fn sequencer(state: &AppState, step: CheckoutStep) -> CheckoutSequencer<CommerceClient> {
    CheckoutSequencer::resume(
        state.commerce().clone(),
        state.config().commerce.payment_provider.clone(),
        step,
    )
}

/// The active cart's ID, required before checkout can do anything.
async fn active_cart_id(session: &Session) -> Result<CartId> {
    let store = crate::cart::SessionCartStore::new(session.clone());
    store
        .load()
        .await
        .map_err(crate::cart::CartError::from)?
        .ok_or_else(|| AppError::BadRequest("No active cart".to_string()))
}

/// Show the step an in-progress checkout is at.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<serde_json::Value>> {
    let step = load_step(&session).await?;
    Ok(Json(serde_json::json!({ "step": step })))
}

/// Submit the contact email and shipping address.
#[instrument(skip(state, session, form))]
pub async fn address(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CheckoutAddressForm>,
) -> Result<Json<CheckoutResponse>> {
    let (email, payload) = form
        .validate(&state.config().commerce.country_code)
        .map_err(AppError::Validation)?;

    let cart_id = active_cart_id(&session).await?;
    let seq = sequencer(&state, load_step(&session).await?);

    let cart = seq.submit_address(&cart_id, &email, &payload).await?;
    let step = seq.current_step().await;
    save_step(&session, step).await?;

    Ok(Json(CheckoutResponse { cart, step }))
}

/// List the shipping options available for the cart.
#[instrument(skip(state, session))]
pub async fn shipping_options(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ShippingOption>>> {
    let cart_id = active_cart_id(&session).await?;
    let seq = sequencer(&state, load_step(&session).await?);
    Ok(Json(seq.shipping_options(&cart_id).await?))
}

/// Attach the chosen shipping option and prepare payment.
#[instrument(skip(state, session, form))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ShippingForm>,
) -> Result<Json<CheckoutResponse>> {
    if form.option_id.trim().is_empty() {
        return Err(AppError::BadRequest("option_id is required".to_string()));
    }

    let cart_id = active_cart_id(&session).await?;
    let seq = sequencer(&state, load_step(&session).await?);

    let cart = seq
        .submit_shipping(&cart_id, &ShippingOptionId::new(form.option_id))
        .await?;
    let step = seq.current_step().await;
    save_step(&session, step).await?;

    Ok(Json(CheckoutResponse { cart, step }))
}

/// Complete the cart into an order.
///
/// On success the cart is discarded and a fresh one is created, and the
/// checkout step resets.
#[instrument(skip(state, session))]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Order>> {
    let cart_id = active_cart_id(&session).await?;
    let seq = sequencer(&state, load_step(&session).await?);

    let order = seq.complete(&cart_id).await?;

    // The completed cart must never be reused
    let cart = container(&state, session.clone());
    if let Err(e) = cart.clear().await {
        tracing::warn!(error = %e, "Failed to start a fresh cart after checkout");
    }
    clear_step(&session).await?;

    Ok(Json(order))
}

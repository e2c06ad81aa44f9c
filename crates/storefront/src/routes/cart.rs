//! Cart route handlers.
//!
//! Each request builds a cart container around the session's cart ID store
//! and the shared commerce client. Responses carry the refreshed cart
//! mirror plus any notices the operation queued.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use jarsy_core::{LineItemId, Price};

use crate::cart::{CartContainer, Notice, SessionCartStore};
use crate::commerce::{Cart, CommerceClient};
use crate::error::{AppError, Result};
use crate::models::forms::{AddItemForm, UpdateItemForm};
use crate::state::AppState;

/// Cart response body: the mirror plus derived figures and notices.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// The cart mirror.
    pub cart: Cart,
    /// Sum of line item quantities.
    pub item_count: u32,
    /// Backend-computed grand total, verbatim.
    pub total: Option<Price>,
    /// Notices queued by this operation.
    pub notices: Vec<Notice>,
}

/// Build the request-scoped cart container.
pub fn container(
    state: &AppState,
    session: Session,
) -> CartContainer<CommerceClient, SessionCartStore> {
    CartContainer::new(
        state.commerce().clone(),
        SessionCartStore::new(session),
        state.config().commerce.region_id.clone(),
        state.config().commerce.currency,
    )
}

async fn respond(
    container: &CartContainer<CommerceClient, SessionCartStore>,
    cart: Cart,
) -> Json<CartResponse> {
    let total = container.total_price().await;
    let notices = container.take_notices().await;
    Json(CartResponse {
        item_count: cart.item_count(),
        cart,
        total,
        notices,
    })
}

/// Show the active cart, creating one on first visit.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartResponse>> {
    let container = container(&state, session);
    let cart = container.initialize().await?;
    Ok(respond(&container, cart).await)
}

/// Add a variant to the cart.
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddItemForm>,
) -> Result<Json<CartResponse>> {
    let (variant_id, quantity) = form.validate().map_err(AppError::Validation)?;

    let container = container(&state, session);
    match container.add_item(&variant_id, quantity).await {
        Ok(cart) => Ok(respond(&container, cart).await),
        Err(e) => Err(e.into()),
    }
}

/// Set a line item's quantity; zero or below removes it.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<String>,
    Json(form): Json<UpdateItemForm>,
) -> Result<Json<CartResponse>> {
    let line_id = LineItemId::new(line_id);
    let container = container(&state, session);
    let cart = container.update_quantity(&line_id, form.quantity).await?;
    Ok(respond(&container, cart).await)
}

/// Remove a line item from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(line_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let line_id = LineItemId::new(line_id);
    let container = container(&state, session);
    let cart = container.remove_item(&line_id).await?;
    Ok(respond(&container, cart).await)
}

/// Discard the cart and start a fresh one.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartResponse>> {
    let container = container(&state, session);
    let cart = container.clear().await?;
    Ok(respond(&container, cart).await)
}

/// Badge count for the header. Never fails; an unreachable backend reads
/// as an empty cart.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Json<serde_json::Value> {
    let container = container(&state, session);
    let count = match container.initialize().await {
        Ok(cart) => cart.item_count(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for count badge");
            0
        }
    };
    Json(serde_json::json!({ "count": count }))
}

//! Account route handlers. All of these require a logged-in customer.

use axum::{
    Json,
    extract::{Path, State},
};
use tower_sessions::Session;
use tracing::instrument;

use jarsy_core::AddressId;

use crate::commerce::{Address, Customer, CustomerOps, Order};
use crate::error::{AppError, Result};
use crate::models::forms::{AddressForm, ProfileForm};
use crate::routes::auth::require_token;
use crate::state::AppState;

/// Show the customer's profile.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<Customer>> {
    let token = require_token(&session).await?;
    Ok(Json(state.commerce().current_customer(&token).await?))
}

/// Update the customer's profile.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Customer>> {
    let token = require_token(&session).await?;
    let input = form.validate().map_err(AppError::Validation)?;
    Ok(Json(state.commerce().update_customer(&token, &input).await?))
}

/// List saved addresses.
#[instrument(skip(state, session))]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Address>>> {
    let token = require_token(&session).await?;
    Ok(Json(state.commerce().list_addresses(&token).await?))
}

/// Save a new address.
#[instrument(skip(state, session, form))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddressForm>,
) -> Result<Json<Customer>> {
    let token = require_token(&session).await?;
    let payload = form
        .validate(&state.config().commerce.country_code)
        .map_err(AppError::Validation)?;
    Ok(Json(state.commerce().create_address(&token, &payload).await?))
}

/// Update a saved address.
#[instrument(skip(state, session, form))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(form): Json<AddressForm>,
) -> Result<Json<Customer>> {
    let token = require_token(&session).await?;
    let payload = form
        .validate(&state.config().commerce.country_code)
        .map_err(AppError::Validation)?;
    let id = AddressId::new(id);
    Ok(Json(
        state.commerce().update_address(&token, &id, &payload).await?,
    ))
}

/// Delete a saved address.
#[instrument(skip(state, session))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Customer>> {
    let token = require_token(&session).await?;
    let id = AddressId::new(id);
    Ok(Json(state.commerce().delete_address(&token, &id).await?))
}

/// List past orders, newest first as reported by the backend.
#[instrument(skip(state, session))]
pub async fn orders(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Order>>> {
    let token = require_token(&session).await?;
    Ok(Json(state.commerce().list_orders(&token).await?))
}

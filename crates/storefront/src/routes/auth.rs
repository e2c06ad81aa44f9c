//! Authentication route handlers.
//!
//! Login exchanges credentials for a backend bearer token, which is kept
//! in the session and attached to customer-scoped calls. The session
//! endpoint answers `null` for anonymous shoppers rather than erroring.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::{AuthToken, Customer};
use crate::customer::CustomerContainer;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::models::forms::{LoginForm, RegisterForm};
use crate::models::session::keys;
use crate::state::AppState;

/// The bearer token stored in the session, if the shopper is logged in.
pub async fn current_token(session: &Session) -> Result<Option<AuthToken>> {
    Ok(session.get::<AuthToken>(keys::AUTH_TOKEN).await?)
}

/// The bearer token, or 401 for anonymous shoppers.
pub async fn require_token(session: &Session) -> Result<AuthToken> {
    current_token(session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))
}

/// Log in with email and password.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<Customer>> {
    let (email, password) = form.validate().map_err(AppError::Validation)?;

    let container = CustomerContainer::new(state.commerce().clone());
    let token = container.login(&email, password).await?;
    session.insert(keys::AUTH_TOKEN, &token).await?;

    let customer = container
        .current()
        .await
        .ok_or_else(|| AppError::Internal("Login succeeded without a customer".to_string()))?;

    set_sentry_user(&customer.id, Some(&customer.email));
    Ok(Json(customer))
}

/// Register a new account.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<Customer>)> {
    let input = form.validate().map_err(AppError::Validation)?;

    let container = CustomerContainer::new(state.commerce().clone());
    let customer = container.register(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Log out, invalidating the backend session and forgetting the token.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    if let Some(token) = current_token(&session).await? {
        let container = CustomerContainer::new(state.commerce().clone());
        container.logout(&token).await;
    }
    session.remove::<AuthToken>(keys::AUTH_TOKEN).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The current customer, or `null` when browsing anonymously.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Option<Customer>>> {
    let token = current_token(&session).await?;
    let container = CustomerContainer::new(state.commerce().clone());
    Ok(Json(container.fetch(token.as_ref()).await))
}

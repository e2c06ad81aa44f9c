//! AI listing copy route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::forms::SuggestForm;
use crate::state::AppState;
use crate::suggest::SuggestionOutput;

/// Generate a description and tagline for a product listing.
///
/// Answers 503 on deployments without an API key configured.
#[instrument(skip(state, form))]
pub async fn generate(
    State(state): State<AppState>,
    Json(form): Json<SuggestForm>,
) -> Result<Json<SuggestionOutput>> {
    let input = form.validate().map_err(AppError::Validation)?;

    let client = state
        .suggestions()
        .ok_or_else(|| AppError::Unavailable("Suggestions are not configured".to_string()))?;

    Ok(Json(client.generate(&input).await?))
}

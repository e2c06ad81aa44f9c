//! AI-generated listing copy.
//!
//! Calls the Anthropic Messages API to draft a product description and
//! tagline from a template name, product name, and category. The feature
//! is optional: when no API key is configured the storefront runs without
//! it and the route answers 503.

mod client;
mod error;
mod types;

pub use client::SuggestionClient;
pub use error::SuggestError;
pub use types::{SuggestionInput, SuggestionOutput};

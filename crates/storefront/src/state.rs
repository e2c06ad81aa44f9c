//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::CommerceClient;
use crate::config::StorefrontConfig;
use crate::suggest::SuggestionClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the commerce client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    suggestions: Option<SuggestionClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The suggestion client is only constructed when an API key is
    /// configured.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let commerce = CommerceClient::new(&config.commerce);
        let suggestions = config.suggest.as_ref().map(SuggestionClient::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                suggestions,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce backend client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get the suggestion client, if the feature is configured.
    #[must_use]
    pub fn suggestions(&self) -> Option<&SuggestionClient> {
        self.inner.suggestions.as_ref()
    }
}

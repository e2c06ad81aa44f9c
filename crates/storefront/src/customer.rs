//! Customer session container.
//!
//! Tracks the authenticated shopper, if any. The bearer token itself lives
//! in the HTTP session; this container turns a token into a customer
//! record and mirrors it locally. A missing or expired token is an
//! expected state, never surfaced as an error.

use tokio::sync::Mutex;
use tracing::{instrument, warn};

use jarsy_core::Email;

use crate::commerce::{AuthToken, CommerceError, Customer, CustomerOps, RegisterInput};

/// Synchronizes the authenticated customer with a local mirror.
pub struct CustomerContainer<C> {
    backend: C,
    state: Mutex<Option<Customer>>,
}

impl<C> CustomerContainer<C>
where
    C: CustomerOps,
{
    /// Create a container with no customer loaded.
    pub const fn new(backend: C) -> Self {
        Self {
            backend,
            state: Mutex::const_new(None),
        }
    }

    /// Exchange credentials for a token and load the customer.
    ///
    /// The caller is responsible for persisting the returned token.
    ///
    /// # Errors
    ///
    /// Returns an error when the credentials are rejected or the backend
    /// call fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthToken, CommerceError> {
        let token = self.backend.login(email, password).await?;
        let customer = self.backend.current_customer(&token).await?;
        *self.state.lock().await = Some(customer);
        Ok(token)
    }

    /// Register a new account. Does not log the customer in.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the registration, e.g.
    /// for a duplicate email.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: &RegisterInput) -> Result<Customer, CommerceError> {
        self.backend.register(input).await
    }

    /// Invalidate the session and clear the mirror.
    ///
    /// Backend failures are logged and swallowed; the local session is
    /// cleared either way.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &AuthToken) {
        if let Err(e) = self.backend.logout(token).await {
            warn!(error = %e, "Backend logout failed, clearing session anyway");
        }
        *self.state.lock().await = None;
    }

    /// Resolve the customer behind the token, refreshing the mirror.
    ///
    /// Returns `None` without error when there is no token, the token has
    /// expired, or the backend is unreachable. Anonymous browsing must
    /// never fail a request.
    #[instrument(skip(self, token))]
    pub async fn fetch(&self, token: Option<&AuthToken>) -> Option<Customer> {
        let Some(token) = token else {
            *self.state.lock().await = None;
            return None;
        };

        match self.backend.current_customer(token).await {
            Ok(customer) => {
                *self.state.lock().await = Some(customer.clone());
                Some(customer)
            }
            Err(CommerceError::Unauthenticated) => {
                *self.state.lock().await = None;
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch customer, treating as anonymous");
                *self.state.lock().await = None;
                None
            }
        }
    }

    /// The mirrored customer, if one is loaded.
    pub async fn current(&self) -> Option<Customer> {
        self.state.lock().await.clone()
    }
}

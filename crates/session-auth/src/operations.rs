//! Credential operations supplied by the embedding application.

use crate::manager::AuthManager;
use crate::state::AuthTokens;
use crate::AuthResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Application-specific credential operations.
///
/// Every operation receives the [`AuthManager`] so it can issue requests
/// through [`AuthManager::http`]. Calls made from inside `sign_in`,
/// `refresh_token`, `get_user` and `sign_out` are never intercepted for
/// refresh, so a 401 there surfaces directly instead of waiting on itself.
#[async_trait]
pub trait AuthOperations: Send + Sync + Sized + 'static {
    /// User record stored alongside the tokens. Persisted as JSON.
    type User: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Credentials passed to [`AuthManager::sign_in`].
    type SignInParams: Send + 'static;

    /// Exchange credentials for a token pair.
    async fn sign_in(
        &self,
        params: Self::SignInParams,
        manager: &AuthManager<Self>,
    ) -> AuthResult<AuthTokens>;

    /// Obtain a new token pair using the current refresh token.
    async fn refresh_token(&self, manager: &AuthManager<Self>) -> AuthResult<AuthTokens>;

    /// Fetch the user for the current access token.
    ///
    /// During sign-in the freshly issued token is already visible through
    /// [`AuthManager::get_access_token`] and the bound client.
    async fn get_user(&self, manager: &AuthManager<Self>) -> AuthResult<Self::User>;

    /// Server-side sign-out. Local state is cleared even if this fails.
    async fn sign_out(&self, _manager: &AuthManager<Self>) -> AuthResult<()> {
        Ok(())
    }

    /// Authorization header value for outbound requests; `None` sends none.
    fn build_authorization_header(&self, manager: &AuthManager<Self>) -> Option<String> {
        manager.bearer_header()
    }
}

//! Refresh coordination.
//!
//! At most one refresh runs per manager. Requests rejected with 401 while a
//! refresh is in flight wait for it and are replayed once with the new
//! header. If the refresh fails the session is signed out and every waiter
//! gets its original 401 response back.
//!
//! Requests made from inside a credential operation (sign-in, refresh,
//! sign-out) are never intercepted. Without that rule a refresh endpoint
//! answering 401 would wait on the very refresh that issued it.

use crate::manager::AuthManager;
use crate::operations::AuthOperations;
use crate::state::AuthTokens;
use crate::{AuthError, AuthResult};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use std::sync::Arc;
use tracing::{debug, info, warn};

tokio::task_local! {
    pub(crate) static CREDENTIAL_CALL: ();
}

/// Whether the current task is running a credential operation.
pub(crate) fn in_credential_call() -> bool {
    CREDENTIAL_CALL.try_with(|_| ()).is_ok()
}

impl<O: AuthOperations> AuthManager<O> {
    /// Refresh the tokens, joining a refresh already in flight.
    ///
    /// On failure the session has been signed out by the time this returns.
    pub async fn refresh(&self) -> AuthResult<AuthTokens> {
        if in_credential_call() {
            return Err(AuthError::CredentialOperation(
                "Cannot refresh from inside a credential operation".to_string(),
            ));
        }
        if !self.get_is_signed_in() {
            return Err(AuthError::NotSignedIn);
        }

        let manager = self.clone();
        self.inner
            .refresh
            .run(move || async move {
                CREDENTIAL_CALL
                    .scope((), manager.perform_refresh())
                    .await
                    .map_err(Arc::new)
            })
            .await
            .map_err(AuthError::RefreshFailed)
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_in_flight()
    }

    async fn perform_refresh(&self) -> AuthResult<AuthTokens> {
        let generation = self.inner.session.generation();
        info!("Refreshing access token");
        match self.inner.operations.refresh_token(self).await {
            Ok(tokens) => {
                // Rejected if the session was signed out or replaced meanwhile.
                self.inner.session.apply_refresh(generation, tokens.clone())?;
                info!("Access token refreshed");
                Ok(tokens)
            }
            Err(e) if self.inner.session.generation() != generation => {
                debug!(error = %e, "Refresh failed for a session that has since changed");
                Err(e)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    warn!(error = %e, "Refresh token rejected by server, signing out");
                } else {
                    warn!(error = %e, "Token refresh failed, signing out");
                }
                self.sign_out().await;
                Err(e)
            }
        }
    }

    /// Send `request` with the current authorization header attached.
    ///
    /// Returns the response and the header value that was sent.
    pub(crate) async fn send_authorized(
        &self,
        mut request: Request,
    ) -> AuthResult<(Response, Option<String>)> {
        let header = self.authorization_header();
        if let Some(value) = &header {
            let mut value =
                HeaderValue::from_str(value).map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        let response = self.inner.http.execute(request).await?;
        Ok((response, header))
    }

    /// Recover from a 401 on `replay`'s original send.
    ///
    /// Returns either the replayed response or the original 401 response.
    pub(crate) async fn recover_unauthorized(
        &self,
        replay: Request,
        sent_header: Option<String>,
        response: Response,
    ) -> AuthResult<Response> {
        if in_credential_call() {
            debug!(url = %replay.url(), "401 inside credential operation, not intercepting");
            return Ok(response);
        }
        if !self.get_is_signed_in() {
            return Ok(response);
        }

        let current = self.authorization_header();
        if current.is_some() && current != sent_header {
            debug!(url = %replay.url(), "Credentials changed since request was sent, replaying");
            return self.send_authorized(replay).await.map(|(response, _)| response);
        }

        match self.refresh().await {
            Ok(_) => {
                debug!(url = %replay.url(), "Replaying request after refresh");
                self.send_authorized(replay).await.map(|(response, _)| response)
            }
            Err(e) => {
                debug!(error = %e, url = %replay.url(), "Refresh failed, returning original response");
                Ok(response)
            }
        }
    }
}

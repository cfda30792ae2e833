//! Auth manager: the embedder-facing handle over one session.
//!
//! An `AuthManager` owns the session state machine, the refresh coordinator
//! and the bound HTTP client. It is a cheap `Clone` handle; every clone talks
//! to the same session.

use crate::client::AuthorizedClient;
use crate::config::AuthConfig;
use crate::coordinator::CREDENTIAL_CALL;
use crate::fsm::SessionStatus;
use crate::operations::AuthOperations;
use crate::session::{Session, SubscriptionId};
use crate::single_flight::SingleFlight;
use crate::state::{AuthTokens, SessionState};
use crate::{AuthError, AuthResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) struct ManagerInner<O: AuthOperations> {
    pub(crate) operations: Arc<O>,
    pub(crate) session: Session<O::User>,
    pub(crate) refresh: SingleFlight<AuthTokens, Arc<AuthError>>,
    pub(crate) http: reqwest::Client,
    // Tokens issued by an in-progress sign-in, visible to get_user before
    // the session is installed.
    pending_sign_in: Mutex<Option<(u64, AuthTokens)>>,
    next_sign_in: AtomicU64,
}

/// Handle to an authenticated session.
pub struct AuthManager<O: AuthOperations> {
    pub(crate) inner: Arc<ManagerInner<O>>,
}

impl<O: AuthOperations> Clone for AuthManager<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: AuthOperations> AuthManager<O> {
    /// Build a manager from `config`.
    ///
    /// The session is seeded from the configured initial state or restored
    /// from storage. With `refresh_token_on_init`, a restored session is
    /// refreshed once; if that fails the manager starts signed out.
    pub async fn create(config: &AuthConfig<O>) -> AuthResult<Self> {
        let http = config.resolve_http_client()?;
        let storage = config.resolve_storage();
        let session = Session::restore(
            storage,
            config.storage_keys.clone(),
            config.initial_state.clone(),
        )?;

        let manager = Self {
            inner: Arc::new(ManagerInner {
                operations: Arc::clone(&config.operations),
                session,
                refresh: SingleFlight::new(),
                http,
                pending_sign_in: Mutex::new(None),
                next_sign_in: AtomicU64::new(1),
            }),
        };

        if config.refresh_token_on_init && manager.get_is_signed_in() {
            debug!("Refreshing restored session");
            if let Err(e) = manager.refresh().await {
                warn!(error = %e, "Refresh on init failed, starting signed out");
            }
        }

        info!(signed_in = manager.get_is_signed_in(), "Auth manager ready");
        Ok(manager)
    }

    /// Sign in with `params`, then load the user.
    ///
    /// Nothing changes unless both the sign-in and user operations succeed.
    /// Signing in while already signed in replaces the session.
    pub async fn sign_in(&self, params: O::SignInParams) -> AuthResult<()> {
        let operations = &self.inner.operations;

        let tokens = CREDENTIAL_CALL
            .scope((), operations.sign_in(params, self))
            .await?;

        let pending = PendingSignIn::install(&self.inner, tokens.clone());
        let result = match CREDENTIAL_CALL.scope((), operations.get_user(self)).await {
            Ok(user) => self.inner.session.apply_sign_in(tokens, user),
            Err(e) => {
                warn!(error = %e, "Failed to load user after sign-in");
                Err(e)
            }
        };
        drop(pending);

        if result.is_ok() {
            info!("Signed in");
        }
        result
    }

    /// Sign out. Always succeeds locally; a failing server-side sign-out is
    /// logged and the session is cleared anyway.
    pub async fn sign_out(&self) {
        if let Err(e) = CREDENTIAL_CALL
            .scope((), self.inner.operations.sign_out(self))
            .await
        {
            warn!(error = %e, "Sign-out operation failed, clearing local session");
        }
        let was_signed_in = self.get_is_signed_in();
        self.inner.session.apply_sign_out();
        if was_signed_in {
            info!("Signed out");
        }
    }

    /// Fetch the user again and replace the stored one.
    ///
    /// Requests made by `get_user` here go through the normal 401 handling.
    pub async fn reload_user(&self) -> AuthResult<O::User> {
        if !self.get_is_signed_in() {
            return Err(AuthError::NotSignedIn);
        }
        let user = self.inner.operations.get_user(self).await?;
        self.inner.session.apply_user(user.clone())?;
        debug!("User reloaded");
        Ok(user)
    }

    /// Current access token. During sign-in this is the newly issued token.
    pub fn get_access_token(&self) -> Option<String> {
        if let Some((_, tokens)) = self.inner.pending_sign_in.lock().as_ref() {
            return Some(tokens.access_token.clone());
        }
        self.inner.session.access_token()
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.inner.session.refresh_token()
    }

    pub fn get_user(&self) -> Option<O::User> {
        self.inner.session.user()
    }

    pub fn get_is_signed_in(&self) -> bool {
        self.inner.session.is_signed_in()
    }

    /// Consistent snapshot of the whole session.
    pub fn state(&self) -> SessionState<O::User> {
        self.inner.session.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.session.status()
    }

    /// Observe session changes. Observers run synchronously after each
    /// transition has been applied and persisted.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&SessionState<O::User>) + Send + Sync + 'static,
    {
        self.inner.session.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.session.unsubscribe(id)
    }

    /// `Bearer <access token>`, or `None` without a token.
    pub fn bearer_header(&self) -> Option<String> {
        self.get_access_token()
            .map(|token| format!("Bearer {}", token))
    }

    /// Header value attached to outbound requests.
    pub fn authorization_header(&self) -> Option<String> {
        self.inner.operations.build_authorization_header(self)
    }

    pub fn operations(&self) -> &O {
        &self.inner.operations
    }

    /// Client whose requests carry the session's authorization header and
    /// recover from 401s with a coordinated refresh.
    pub fn http(&self) -> AuthorizedClient<O> {
        AuthorizedClient::new(self.clone())
    }

    /// The underlying client, without authorization handling.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Whether both handles refer to the same manager.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Publishes sign-in tokens until dropped.
struct PendingSignIn<'a, O: AuthOperations> {
    inner: &'a ManagerInner<O>,
    id: u64,
}

impl<'a, O: AuthOperations> PendingSignIn<'a, O> {
    fn install(inner: &'a ManagerInner<O>, tokens: AuthTokens) -> Self {
        let id = inner.next_sign_in.fetch_add(1, Ordering::Relaxed);
        *inner.pending_sign_in.lock() = Some((id, tokens));
        Self { inner, id }
    }
}

impl<O: AuthOperations> Drop for PendingSignIn<'_, O> {
    fn drop(&mut self) {
        let mut pending = self.inner.pending_sign_in.lock();
        // A later sign-in may have replaced ours.
        if pending.as_ref().map(|(id, _)| *id) == Some(self.id) {
            *pending = None;
        }
    }
}

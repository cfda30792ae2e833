//! Lazily constructed, shared auth manager.
//!
//! The first `get_auth_manager` call builds the manager; concurrent callers
//! join that construction and receive the same instance. A failed
//! construction is reported to everyone who joined it and leaves nothing
//! cached, so the next call starts over.

use crate::config::AuthConfig;
use crate::manager::AuthManager;
use crate::operations::AuthOperations;
use crate::single_flight::SingleFlight;
use crate::{AuthError, AuthResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Race-safe lazy singleton for [`AuthManager`].
pub struct AuthFactory<O: AuthOperations> {
    instance: Arc<RwLock<Option<AuthManager<O>>>>,
    construction: SingleFlight<AuthManager<O>, Arc<AuthError>>,
}

impl<O: AuthOperations> AuthFactory<O> {
    pub fn new() -> Self {
        Self {
            instance: Arc::new(RwLock::new(None)),
            construction: SingleFlight::new(),
        }
    }

    /// Return the shared manager, building it from `config` on first use.
    ///
    /// `config` is ignored once an instance exists.
    pub async fn get_auth_manager(&self, config: &AuthConfig<O>) -> AuthResult<AuthManager<O>> {
        if let Some(manager) = self.instance() {
            return Ok(manager);
        }

        let config = config.clone();
        let instance = Arc::clone(&self.instance);
        self.construction
            .run(move || async move {
                let existing = instance.read().clone();
                if let Some(manager) = existing {
                    return Ok(manager);
                }
                debug!("Constructing auth manager");
                let manager = AuthManager::create(&config).await.map_err(Arc::new)?;
                *instance.write() = Some(manager.clone());
                info!("Auth manager constructed");
                Ok(manager)
            })
            .await
            .map_err(AuthError::Construction)
    }

    /// The cached manager, without constructing one.
    pub fn instance(&self) -> Option<AuthManager<O>> {
        self.instance.read().clone()
    }

    /// Drop the cached manager; the next call constructs a new one.
    ///
    /// A construction already in flight still completes and caches its
    /// result.
    pub fn reset(&self) -> Option<AuthManager<O>> {
        let previous = self.instance.write().take();
        if previous.is_some() {
            debug!("Auth factory reset");
        }
        previous
    }
}

impl<O: AuthOperations> Default for AuthFactory<O> {
    fn default() -> Self {
        Self::new()
    }
}

//! Auth manager configuration.

use crate::operations::AuthOperations;
use crate::state::SessionState;
use crate::AuthResult;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use session_storage::{create_storage, MemoryStorage, SessionStorage, StorageKeys};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for building an [`AuthManager`](crate::AuthManager).
pub struct AuthConfig<O: AuthOperations> {
    pub(crate) operations: Arc<O>,
    pub(crate) refresh_token_on_init: bool,
    pub(crate) initial_state: Option<SessionState<O::User>>,
    pub(crate) storage_keys: StorageKeys,
    pub(crate) storage: Option<Arc<dyn SessionStorage>>,
    pub(crate) http_client: Option<reqwest::Client>,
}

impl<O: AuthOperations> AuthConfig<O> {
    /// Configuration with defaults for everything but the operations.
    pub fn new(operations: O) -> Self {
        Self {
            operations: Arc::new(operations),
            refresh_token_on_init: false,
            initial_state: None,
            storage_keys: StorageKeys::default(),
            storage: None,
            http_client: None,
        }
    }

    /// Refresh once during construction when a stored session exists.
    pub fn with_refresh_token_on_init(mut self, enabled: bool) -> Self {
        self.refresh_token_on_init = enabled;
        self
    }

    /// Seed the session instead of reading storage.
    pub fn with_initial_state(mut self, state: SessionState<O::User>) -> Self {
        self.initial_state = Some(state);
        self
    }

    pub fn with_storage_keys(mut self, keys: StorageKeys) -> Self {
        self.storage_keys = keys;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use an existing client; its default headers are kept.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn operations(&self) -> &Arc<O> {
        &self.operations
    }

    pub fn refresh_token_on_init(&self) -> bool {
        self.refresh_token_on_init
    }

    pub fn storage_keys(&self) -> &StorageKeys {
        &self.storage_keys
    }

    /// Configured storage, or the persistent default.
    pub(crate) fn resolve_storage(&self) -> Arc<dyn SessionStorage> {
        if let Some(storage) = &self.storage {
            return Arc::clone(storage);
        }
        match create_storage() {
            Ok(storage) => {
                debug!(path = %storage.path().display(), "Using file storage");
                Arc::new(storage)
            }
            Err(e) => {
                warn!(error = %e, "Persistent storage unavailable, sessions will not survive restarts");
                Arc::new(MemoryStorage::new())
            }
        }
    }

    /// Configured client, or a new one sending JSON by default.
    pub(crate) fn resolve_http_client(&self) -> AuthResult<reqwest::Client> {
        if let Some(client) = &self.http_client {
            return Ok(client.clone());
        }
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(client)
    }
}

impl<O: AuthOperations> Clone for AuthConfig<O> {
    fn clone(&self) -> Self {
        Self {
            operations: Arc::clone(&self.operations),
            refresh_token_on_init: self.refresh_token_on_init,
            initial_state: self.initial_state.clone(),
            storage_keys: self.storage_keys.clone(),
            storage: self.storage.clone(),
            http_client: self.http_client.clone(),
        }
    }
}

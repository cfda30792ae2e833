//! CLI command implementations.

mod auth;
mod request;

pub use auth::{login, logout, refresh, status};
pub use request::request;

use crate::api::JsonApi;
use crate::output::OutputFormat;
use anyhow::{Context as _, Result};
use session_auth::{AuthConfig, AuthFactory, AuthManager, FileStorage, SessionStorage};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state for one CLI invocation.
pub struct Context {
    pub format: OutputFormat,
    store_path: PathBuf,
    config: AuthConfig<JsonApi>,
    factory: AuthFactory<JsonApi>,
}

impl Context {
    pub fn new(api_url: &str, store: Option<PathBuf>, format: OutputFormat) -> Result<Self> {
        let api = JsonApi::new(api_url).with_context(|| format!("Invalid API URL {}", api_url))?;
        let store_path = match store {
            Some(path) => path,
            None => session_storage::default_store_path()
                .context("No data directory available; pass --store")?,
        };
        let storage = FileStorage::open(&store_path)
            .with_context(|| format!("Cannot open session store {}", store_path.display()))?;
        let storage: Arc<dyn SessionStorage> = Arc::new(storage);

        Ok(Self {
            format,
            store_path,
            config: AuthConfig::new(api).with_storage(storage),
            factory: AuthFactory::new(),
        })
    }

    /// The session manager, restored from the store on first use.
    pub async fn manager(&self) -> Result<AuthManager<JsonApi>> {
        Ok(self.factory.get_auth_manager(&self.config).await?)
    }

    pub fn api(&self) -> &JsonApi {
        self.config.operations()
    }

    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }
}

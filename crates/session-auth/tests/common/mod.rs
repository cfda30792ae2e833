#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use session_auth::{
    AuthConfig, AuthError, AuthManager, AuthOperations, AuthResult, AuthTokens, MemoryStorage,
    SessionState, SessionStorage, StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestUser {
    pub id: u64,
    pub name: String,
}

pub fn alice() -> TestUser {
    TestUser {
        id: 1,
        name: "alice".to_string(),
    }
}

pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn credentials(password: &str) -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: password.to_string(),
    }
}

/// How `refresh_token` behaves.
#[derive(Clone)]
pub enum RefreshBehavior {
    /// Return these tokens.
    Succeed(AuthTokens),
    /// Reject without any network call.
    Fail,
    /// POST `{base_url}/refresh` through the bound client.
    Http,
}

/// Call counters shared between a test and the operations it configured.
#[derive(Default)]
pub struct Calls {
    pub sign_in: AtomicUsize,
    pub refresh: AtomicUsize,
    pub get_user: AtomicUsize,
    pub sign_out: AtomicUsize,
    /// Access token visible to each `get_user` call.
    pub seen_tokens: Mutex<Vec<Option<String>>>,
}

impl Calls {
    pub fn sign_in(&self) -> usize {
        self.sign_in.load(Ordering::SeqCst)
    }

    pub fn refresh(&self) -> usize {
        self.refresh.load(Ordering::SeqCst)
    }

    pub fn get_user(&self) -> usize {
        self.get_user.load(Ordering::SeqCst)
    }

    pub fn sign_out(&self) -> usize {
        self.sign_out.load(Ordering::SeqCst)
    }
}

pub struct TestOperations {
    pub calls: Arc<Calls>,
    pub base_url: Option<String>,
    pub refresh: RefreshBehavior,
    pub refresh_delay: Duration,
    pub header_scheme: Option<String>,
    pub fail_get_user: bool,
    pub fail_sign_out: bool,
}

impl TestOperations {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            base_url: None,
            refresh: RefreshBehavior::Succeed(AuthTokens::new("A2", "R2")),
            refresh_delay: Duration::ZERO,
            header_scheme: None,
            fail_get_user: false,
            fail_sign_out: false,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn with_refresh(mut self, behavior: RefreshBehavior) -> Self {
        self.refresh = behavior;
        self
    }

    pub fn with_refresh_delay(mut self, millis: u64) -> Self {
        self.refresh_delay = Duration::from_millis(millis);
        self
    }

    pub fn with_header_scheme(mut self, scheme: &str) -> Self {
        self.header_scheme = Some(scheme.to_string());
        self
    }

    pub fn failing_get_user(mut self) -> Self {
        self.fail_get_user = true;
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    fn url(&self, path: &str) -> AuthResult<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base, path))
            .ok_or_else(|| AuthError::Config("no base url".to_string()))
    }
}

#[async_trait]
impl AuthOperations for TestOperations {
    type User = TestUser;
    type SignInParams = Credentials;

    async fn sign_in(
        &self,
        params: Credentials,
        _manager: &AuthManager<Self>,
    ) -> AuthResult<AuthTokens> {
        self.calls.sign_in.fetch_add(1, Ordering::SeqCst);
        if params.password == "wrong" {
            return Err(AuthError::CredentialOperation(
                "invalid credentials".to_string(),
            ));
        }
        Ok(AuthTokens::new("A1", "R1"))
    }

    async fn refresh_token(&self, manager: &AuthManager<Self>) -> AuthResult<AuthTokens> {
        self.calls.refresh.fetch_add(1, Ordering::SeqCst);
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        match &self.refresh {
            RefreshBehavior::Succeed(tokens) => Ok(tokens.clone()),
            RefreshBehavior::Fail => Err(AuthError::CredentialOperation(
                "refresh rejected".to_string(),
            )),
            RefreshBehavior::Http => {
                let response = manager
                    .http()
                    .post(&self.url("/refresh")?)
                    .json(&serde_json::json!({ "refreshToken": manager.get_refresh_token() }))
                    .send()
                    .await?;
                Ok(response.error_for_status()?.json().await?)
            }
        }
    }

    async fn get_user(&self, manager: &AuthManager<Self>) -> AuthResult<TestUser> {
        self.calls.get_user.fetch_add(1, Ordering::SeqCst);
        self.calls.seen_tokens.lock().push(manager.get_access_token());
        if self.fail_get_user {
            return Err(AuthError::CredentialOperation("user lookup failed".to_string()));
        }
        if self.base_url.is_none() {
            return Ok(alice());
        }
        let response = manager.http().get(&self.url("/me")?).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }

    async fn sign_out(&self, _manager: &AuthManager<Self>) -> AuthResult<()> {
        self.calls.sign_out.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(AuthError::CredentialOperation("server unavailable".to_string()));
        }
        Ok(())
    }

    fn build_authorization_header(&self, manager: &AuthManager<Self>) -> Option<String> {
        match &self.header_scheme {
            Some(scheme) => manager
                .get_access_token()
                .map(|token| format!("{} {}", scheme, token)),
            None => manager.bearer_header(),
        }
    }
}

/// In-memory storage that counts every call.
#[derive(Default)]
pub struct RecordingStorage {
    pub inner: MemoryStorage,
    pub calls: AtomicUsize,
}

impl RecordingStorage {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionStorage for RecordingStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

pub fn signed_in(access_token: &str, refresh_token: &str) -> SessionState<TestUser> {
    SessionState::signed_in(AuthTokens::new(access_token, refresh_token), alice())
}

/// Config backed by a fresh in-memory store.
pub fn memory_config(operations: TestOperations) -> (AuthConfig<TestOperations>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let config = AuthConfig::new(operations).with_storage(storage.clone());
    (config, storage)
}

/// Manager already signed in as alice with tokens A1/R1.
pub async fn signed_in_manager(
    operations: TestOperations,
) -> (AuthManager<TestOperations>, Arc<MemoryStorage>, Arc<Calls>) {
    let calls = operations.calls.clone();
    let (config, storage) = memory_config(operations);
    let manager = AuthManager::create(&config.with_initial_state(signed_in("A1", "R1")))
        .await
        .expect("create failed");
    (manager, storage, calls)
}

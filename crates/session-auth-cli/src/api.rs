//! Credential operations for a JSON auth API.
//!
//! Endpoints, relative to the API base URL:
//! - `POST auth/sign-in` with `{"email", "password"}` returns a token pair
//! - `POST auth/refresh` with `{"refreshToken"}` returns a token pair
//! - `GET auth/me` returns the user
//! - `POST auth/sign-out` (best effort)
//!
//! Token pairs use the `{"accessToken", "refreshToken"}` shape.

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use session_auth::{AuthError, AuthManager, AuthOperations, AuthResult, AuthTokens};
use tracing::debug;
use url::Url;

/// User returned by `auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ApiUser {
    /// Best human-readable label.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Sign-in credentials.
#[derive(Debug, Clone, Serialize)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

/// Operations against one API base URL.
#[derive(Debug, Clone)]
pub struct JsonApi {
    base_url: Url,
}

impl JsonApi {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base.
    pub fn endpoint(&self, path: &str) -> AuthResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AuthError::Config(format!("Invalid path {:?}: {}", path, e)))
    }
}

/// Map a non-success status from a credential endpoint to an error.
fn check(endpoint: &str, response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(AuthError::CredentialOperation(format!(
        "{} returned {}",
        endpoint, status
    )))
}

#[async_trait]
impl AuthOperations for JsonApi {
    type User = ApiUser;
    type SignInParams = LoginParams;

    async fn sign_in(
        &self,
        params: LoginParams,
        manager: &AuthManager<Self>,
    ) -> AuthResult<AuthTokens> {
        debug!(email = %params.email, "Signing in");
        let response = manager
            .http()
            .post(self.endpoint("auth/sign-in")?.as_str())
            .json(&params)
            .send()
            .await?;
        Ok(check("sign-in", response)?.json().await?)
    }

    async fn refresh_token(&self, manager: &AuthManager<Self>) -> AuthResult<AuthTokens> {
        let refresh_token = manager.get_refresh_token().ok_or(AuthError::NotSignedIn)?;
        let response = manager
            .http()
            .post(self.endpoint("auth/refresh")?.as_str())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;
        Ok(check("refresh", response)?.json().await?)
    }

    async fn get_user(&self, manager: &AuthManager<Self>) -> AuthResult<ApiUser> {
        let response = manager
            .http()
            .get(self.endpoint("auth/me")?.as_str())
            .send()
            .await?;
        Ok(check("me", response)?.json().await?)
    }

    async fn sign_out(&self, manager: &AuthManager<Self>) -> AuthResult<()> {
        if !manager.get_is_signed_in() {
            return Ok(());
        }
        let response = manager
            .http()
            .post(self.endpoint("auth/sign-out")?.as_str())
            .send()
            .await?;
        check("sign-out", response)?;
        Ok(())
    }
}

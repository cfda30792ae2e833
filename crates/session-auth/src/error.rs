//! Authentication error types.

use session_storage::StorageError;
use std::sync::Arc;
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A caller-supplied credential operation (sign-in, refresh, get-user) rejected
    #[error("Credential operation failed: {0}")]
    CredentialOperation(String),

    /// The coordinated refresh failed; every request waiting on it sees this
    #[error("Token refresh failed: {0}")]
    RefreshFailed(Arc<AuthError>),

    /// Operation requires a signed-in session
    #[error("Not signed in")]
    NotSignedIn,

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Configured initial state violates the signed-in/signed-out invariant
    #[error("Invalid initial state: {0}")]
    InvalidInitialState(String),

    /// Authorization header value is not a valid HTTP header
    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),

    /// Auth manager construction failed; every waiter of that attempt sees this
    #[error("Auth manager construction failed: {0}")]
    Construction(Arc<AuthError>),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns true if this error is (or wraps) an HTTP 401/403 rejection.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::Http(e) => e
                .status()
                .map(|status| status.as_u16() == 401 || status.as_u16() == 403)
                .unwrap_or(false),
            AuthError::RefreshFailed(inner) | AuthError::Construction(inner) => {
                inner.is_unauthorized()
            }
            _ => false,
        }
    }

    /// The innermost error behind any shared single-flight wrappers.
    pub fn root_cause(&self) -> &AuthError {
        match self {
            AuthError::RefreshFailed(inner) | AuthError::Construction(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

//! Session data types.

use serde::{Deserialize, Serialize};

/// Token pair returned by the sign-in and refresh operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Current session credentials and user.
///
/// `is_signed_in` is true iff all three credential fields are present, and
/// false iff all three are absent. Use [`SessionState::signed_in`] and
/// [`SessionState::signed_out`] to build values that hold this invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState<U> {
    pub is_signed_in: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<U>,
}

impl<U> SessionState<U> {
    pub fn signed_out() -> Self {
        Self {
            is_signed_in: false,
            access_token: None,
            refresh_token: None,
            user: None,
        }
    }

    pub fn signed_in(tokens: AuthTokens, user: U) -> Self {
        Self {
            is_signed_in: true,
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            user: Some(user),
        }
    }

    /// Whether the fields agree with `is_signed_in`.
    pub fn is_consistent(&self) -> bool {
        let present = [
            self.access_token.is_some(),
            self.refresh_token.is_some(),
            self.user.is_some(),
        ];
        if self.is_signed_in {
            present.iter().all(|p| *p)
        } else {
            present.iter().all(|p| !*p)
        }
    }

    /// The token pair, when signed in.
    pub fn tokens(&self) -> Option<AuthTokens> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(AuthTokens::new(access, refresh)),
            _ => None,
        }
    }
}

impl<U> Default for SessionState<U> {
    fn default() -> Self {
        Self::signed_out()
    }
}

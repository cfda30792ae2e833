//! Storage key configuration.

/// Keys of the three slots a session occupies in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Access token slot
    pub access_token: String,
    /// Refresh token slot
    pub refresh_token: String,
    /// Serialized user slot (JSON)
    pub user: String,
}

impl StorageKeys {
    /// Default access token key
    pub const DEFAULT_ACCESS_TOKEN: &'static str = "@ds/auth/access";

    /// Default refresh token key
    pub const DEFAULT_REFRESH_TOKEN: &'static str = "@ds/auth/refresh";

    /// Default user key
    pub const DEFAULT_USER: &'static str = "@ds/auth/user";

    /// Build keys under a custom namespace, e.g. `myapp/auth/access`.
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self {
            access_token: format!("{}/access", prefix),
            refresh_token: format!("{}/refresh", prefix),
            user: format!("{}/user", prefix),
        }
    }

    /// All three keys, in slot order.
    pub fn all(&self) -> [&str; 3] {
        [&self.access_token, &self.refresh_token, &self.user]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: Self::DEFAULT_ACCESS_TOKEN.to_string(),
            refresh_token: Self::DEFAULT_REFRESH_TOKEN.to_string(),
            user: Self::DEFAULT_USER.to_string(),
        }
    }
}

//! Session-related types.
//!
//! Values persisted across runs to identify the logged-in user.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::price::deserialize_or_zero;

/// Bearer token returned by `POST /auth/login`.
///
/// `Debug` never prints the token itself.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }

    /// Expose the raw token for persistence.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for AuthToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Successful login payload.
///
/// ```json
/// { "success": true, "token": "testtoken", "username": "criodo", "balance": 5000 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_or_zero")]
    pub balance: Decimal,
}

/// The logged-in user as reconstructed from the session store.
#[derive(Debug, Clone)]
pub struct UserSession {
    /// API token used to authenticate cart requests.
    pub token: AuthToken,
    /// Username the user is logged in as.
    pub username: String,
    /// Wallet balance at login time.
    pub balance: Decimal,
}

impl From<LoginResponse> for UserSession {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            username: response.username,
            balance: response.balance,
        }
    }
}

/// Keys under which the session is stored.
pub mod keys {
    /// Key for the API bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the logged-in username.
    pub const USERNAME: &str = "username";

    /// Key for the wallet balance.
    pub const BALANCE: &str = "balance";
}

//! QKart REST backend access.
//!
//! # Architecture
//!
//! - [`Backend`] is the seam every service talks to, so services can be
//!   exercised without a network
//! - [`BackendClient`] implements it over `reqwest`
//! - The catalog and search results are cached in memory via `moka`
//!   (5 minute TTL by default); carts are never cached
//!
//! # Endpoints
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `GET` | `/products` | - |
//! | `GET` | `/products/search?value=<query>` | - |
//! | `GET` | `/cart` | Bearer |
//! | `POST` | `/cart` | Bearer |
//! | `POST` | `/auth/register` | - |
//! | `POST` | `/auth/login` | - |

mod cache;
mod client;

#[cfg(test)]
pub(crate) mod fake;

pub use client::BackendClient;

use async_trait::async_trait;
use qkart_core::{AuthToken, CartRecord, Credentials, LoginResponse, Product, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request could not complete (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request was rejected with a client error (4xx) and a message.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend failed (5xx or unexpected status).
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Request URL could not be built from the configured endpoint.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// Whether the request never produced a usable response.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Parse(_) | Self::Api { .. })
    }
}

/// Operations the storefront needs from the REST backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the full catalog.
    async fn fetch_products(&self) -> Result<Vec<Product>, BackendError>;

    /// Search the catalog. "No matches" is an empty list, never an error.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, BackendError>;

    /// Fetch the user's cart records.
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Vec<CartRecord>, BackendError>;

    /// Set the quantity of `product_id` (0 removes it). Returns the
    /// authoritative cart after the mutation.
    async fn mutate_cart(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        qty: i64,
    ) -> Result<Vec<CartRecord>, BackendError>;

    /// Create a new account.
    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError>;

    /// Exchange credentials for a token.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError>;
}

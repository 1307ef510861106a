//! `reqwest` implementation of [`Backend`].
//!
//! Error bodies follow the backend's `{ "success": false, "message": "..." }`
//! convention; the message is carried into [`BackendError`] so it can be shown
//! to the user as-is.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use qkart_core::{AuthToken, CartRecord, Credentials, LoginResponse, Product, ProductId};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{Backend, BackendError};
use crate::config::ClientConfig;

/// Longest slice of a response body included in logs and fallback messages.
const BODY_PREVIEW_CHARS: usize = 200;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the QKart REST backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

/// Body sent to `POST /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartMutation<'a> {
    product_id: &'a ProductId,
    qty: i64,
}

/// Error payload returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// A zero `catalog_cache_ttl` disables caching.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = (config.catalog_cache_ttl > Duration::ZERO).then(|| {
            Cache::builder()
                .max_capacity(256)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base: config.api_endpoint.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Drop every cached catalog and search response.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }

    /// Build an absolute URL for `path` under the configured endpoint.
    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(Url::parse(&format!("{}/{path}", self.inner.base))?)
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    /// Send a request and decode a successful JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.execute_raw(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&body),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request and return the body of a successful response.
    async fn execute_raw(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(error_from_status(status, &body))
        }
    }
}

#[async_trait]
impl Backend for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(products) = self.cached(&CacheKey::Products).await {
            debug!("Cache hit for catalog");
            return Ok(products.as_ref().clone());
        }

        let url = self.url("products")?;
        let products: Vec<Product> = self.execute(self.inner.client.get(url)).await?;
        debug!(count = products.len(), "Fetched catalog");

        self.store(CacheKey::Products, Arc::new(products.clone())).await;
        Ok(products)
    }

    #[instrument(skip(self), fields(query = %query))]
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, BackendError> {
        let key = CacheKey::Search(query.to_string());
        if let Some(products) = self.cached(&key).await {
            debug!("Cache hit for search");
            return Ok(products.as_ref().clone());
        }

        let mut url = self.url("products/search")?;
        url.query_pairs_mut().append_pair("value", query);

        let products: Vec<Product> = match self.execute(self.inner.client.get(url)).await {
            Ok(products) => products,
            // The backend answers 404 when nothing matches
            Err(BackendError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        debug!(count = products.len(), "Search completed");

        self.store(key, Arc::new(products.clone())).await;
        Ok(products)
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Vec<CartRecord>, BackendError> {
        let url = self.url("cart")?;
        let request = self
            .inner
            .client
            .get(url)
            .header(AUTHORIZATION, token.bearer_header());
        self.execute(request).await
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn mutate_cart(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        qty: i64,
    ) -> Result<Vec<CartRecord>, BackendError> {
        let url = self.url("cart")?;
        let request = self
            .inner
            .client
            .post(url)
            .header(AUTHORIZATION, token.bearer_header())
            .json(&CartMutation { product_id, qty });
        self.execute(request).await
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError> {
        let url = self.url("auth/register")?;
        self.execute_raw(self.inner.client.post(url).json(credentials))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        let url = self.url("auth/login")?;
        self.execute(self.inner.client.post(url).json(credentials))
            .await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Map a non-success response to a [`BackendError`].
fn error_from_status(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| preview(body), str::to_string)
        });

    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        s if s.is_client_error() => BackendError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => {
            tracing::error!(
                status = %s,
                body = %preview(body),
                "Backend returned non-success status"
            );
            BackendError::Api {
                status: s.as_u16(),
                message,
            }
        }
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

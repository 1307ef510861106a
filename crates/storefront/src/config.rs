//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QKART_API_ENDPOINT` - Base URL of the REST backend (e.g., `https://host/api/v1`)
//!
//! ## Optional
//! - `QKART_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `QKART_SEARCH_DEBOUNCE_MS` - Quiet interval for search-as-you-type (default: 500)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `QKART_SESSION_FILE` - Where the login session is persisted (default: `.qkart/session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";
const DEFAULT_SEARCH_DEBOUNCE_MS: &str = "500";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";
const DEFAULT_SESSION_FILE: &str = ".qkart/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend
    pub api_endpoint: Url,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Quiet interval before a search query is sent
    pub search_debounce: Duration,
    /// How long the catalog and search results stay cached
    pub catalog_cache_ttl: Duration,
    /// Path of the persisted session file
    pub session_file: PathBuf,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when unset
    pub dsn: Option<String>,
    /// Environment name reported with events
    pub environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(lookup);

        let raw_endpoint = source.required("QKART_API_ENDPOINT")?;
        let api_endpoint = Url::parse(&raw_endpoint).map_err(|e| {
            ConfigError::InvalidEnvVar("QKART_API_ENDPOINT".to_string(), e.to_string())
        })?;
        if !matches!(api_endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "QKART_API_ENDPOINT".to_string(),
                format!("unsupported scheme '{}'", api_endpoint.scheme()),
            ));
        }

        let request_timeout = Duration::from_secs(
            source.parsed("QKART_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
        );
        let search_debounce = Duration::from_millis(
            source.parsed("QKART_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS)?,
        );
        let catalog_cache_ttl = Duration::from_secs(
            source.parsed("QKART_CATALOG_CACHE_TTL_SECS", DEFAULT_CATALOG_CACHE_TTL_SECS)?,
        );
        let session_file =
            PathBuf::from(source.or_default("QKART_SESSION_FILE", DEFAULT_SESSION_FILE));

        let sentry = SentryConfig {
            dsn: source.optional("SENTRY_DSN"),
            environment: source.optional("SENTRY_ENVIRONMENT"),
        };

        Ok(Self {
            api_endpoint,
            request_timeout,
            search_debounce,
            catalog_cache_ttl,
            session_file,
            sentry,
        })
    }

    /// Create a configuration for `api_endpoint` with every other value at its default.
    #[must_use]
    pub fn with_endpoint(api_endpoint: Url) -> Self {
        Self {
            api_endpoint,
            request_timeout: Duration::from_secs(30),
            search_debounce: Duration::from_millis(500),
            catalog_cache_ttl: Duration::from_secs(300),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            sentry: SentryConfig::default(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup shared by the configuration loaders.
struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a required variable. Empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a variable with a default value and parse it.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

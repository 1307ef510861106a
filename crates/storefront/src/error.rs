//! Unified error handling for storefront operations.
//!
//! Provides a unified `StorefrontError` type returned by every service. Each
//! variant maps to exactly one user-facing message via
//! [`StorefrontError::user_message`], which is what services hand to the
//! notifier.

use qkart_core::ValidationError;
use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::session::SessionError;

/// Message shown when the backend cannot be reached or answers garbage.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// User input failed a form rule; no request was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Credentials rejected or account already exists.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Operation requires a logged-in user.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl StorefrontError {
    /// The single message shown to the user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Auth(message) => message.clone(),
            Self::NotLoggedIn => "Login to add an item to the Cart".to_string(),
            Self::Backend(err) => match err {
                BackendError::Rejected { message, .. }
                | BackendError::Unauthorized(message)
                | BackendError::NotFound(message) => message.clone(),
                BackendError::Http(_)
                | BackendError::Parse(_)
                | BackendError::Api { .. }
                | BackendError::Url(_) => NETWORK_ERROR_MESSAGE.to_string(),
            },
            Self::Session(_) => "Could not access the saved session".to_string(),
            Self::Config(err) => err.to_string(),
        }
    }

    /// Whether the failure is a network problem rather than a rejection.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Backend(err) if err.is_network())
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

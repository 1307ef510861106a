//! Shared storefront context.

use std::sync::Arc;

use crate::backend::{Backend, BackendClient, BackendError};
use crate::config::ClientConfig;
use crate::notify::Notifier;
use crate::search::SearchController;
use crate::services::{AuthService, CartService};
use crate::session::{FileSessionStore, SessionStore};

/// Collaborators shared by every service.
///
/// This struct is cheaply cloneable via `Arc` and hands out services wired to
/// the same backend, session store and notifier.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    backend: Arc<dyn Backend>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl Storefront {
    /// Assemble a storefront from explicit collaborators.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn Backend>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(StorefrontInner {
                config,
                backend,
                session,
                notifier,
            }),
        }
    }

    /// Build the HTTP backend client and file session store from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, BackendError> {
        let backend = Arc::new(BackendClient::new(&config)?);
        let session = Arc::new(FileSessionStore::new(config.session_file.clone()));
        Ok(Self::new(config, backend, session, notifier))
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get the backend.
    #[must_use]
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.inner.backend)
    }

    /// Get the session store.
    #[must_use]
    pub fn session(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.inner.session)
    }

    /// Get the notifier.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Authentication service.
    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.backend(), self.session(), self.notifier())
    }

    /// A fresh, unloaded cart service.
    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(self.backend(), self.session(), self.notifier())
    }

    /// A search controller using the configured debounce interval.
    #[must_use]
    pub fn search(&self) -> SearchController {
        SearchController::new(
            self.backend(),
            self.notifier(),
            self.inner.config.search_debounce,
        )
    }
}

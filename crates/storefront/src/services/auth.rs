//! Authentication service.
//!
//! Validates forms locally, talks to the backend and keeps the session store
//! in sync with the logged-in user.

use std::sync::Arc;

use qkart_core::{LoginForm, RegisterForm, UserSession};
use tracing::{info, instrument};

use super::report;
use crate::backend::{Backend, BackendError};
use crate::error::{Result, StorefrontError};
use crate::notify::{Notification, Notifier};
use crate::session::{self, SessionStore};

/// Shown when a registration is rejected without a message.
const REGISTER_REJECTED_MESSAGE: &str = "Username is already taken";

/// Shown when a login is rejected without a message.
const LOGIN_REJECTED_MESSAGE: &str = "Invalid username or password";

/// Authentication service.
///
/// Handles registration, login and logout.
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn Backend>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            session,
            notifier,
        }
    }

    // =========================================================================
    // Account Lifecycle
    // =========================================================================

    /// Register a new account.
    ///
    /// Invalid forms are reported without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` if the form breaks a rule,
    /// `StorefrontError::Auth` if the backend rejects the registration, or
    /// `StorefrontError::Backend` if the backend cannot be reached.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<()> {
        let credentials = form
            .validate()
            .map_err(|e| report(self.notifier.as_ref(), e.into()))?;

        self.backend
            .register(&credentials)
            .await
            .map_err(|e| report(self.notifier.as_ref(), rejection(e, REGISTER_REJECTED_MESSAGE)))?;

        info!("Registered new account");
        self.notifier
            .notify(Notification::success("Registered successfully"));
        Ok(())
    }

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` if a field is missing,
    /// `StorefrontError::Auth` if the credentials are rejected,
    /// `StorefrontError::Backend` if the backend cannot be reached, or
    /// `StorefrontError::Session` if the session cannot be saved.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn login(&self, form: &LoginForm) -> Result<UserSession> {
        let credentials = form
            .validate()
            .map_err(|e| report(self.notifier.as_ref(), e.into()))?;

        let response = self
            .backend
            .login(&credentials)
            .await
            .map_err(|e| report(self.notifier.as_ref(), rejection(e, LOGIN_REJECTED_MESSAGE)))?;

        session::persist_login(self.session.as_ref(), &response)
            .map_err(|e| report(self.notifier.as_ref(), e.into()))?;

        info!("Logged in");
        self.notifier
            .notify(Notification::success("Logged in successfully"));
        Ok(response.into())
    }

    /// Forget the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Session` if the session cannot be cleared.
    pub fn logout(&self) -> Result<()> {
        session::logout(self.session.as_ref())
            .map_err(|e| report(self.notifier.as_ref(), e.into()))?;
        self.notifier.notify(Notification::info("Logged out"));
        Ok(())
    }

    /// The logged-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Session` if the session cannot be read.
    pub fn current_session(&self) -> Result<Option<UserSession>> {
        Ok(session::load_session(self.session.as_ref())?)
    }
}

/// Turn a backend rejection into an auth error carrying its message.
fn rejection(err: BackendError, fallback: &str) -> StorefrontError {
    match err {
        BackendError::Rejected { message, .. } if message.is_empty() => {
            StorefrontError::Auth(fallback.to_string())
        }
        BackendError::Rejected { message, .. } => StorefrontError::Auth(message),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeBackend, VALID_TOKEN};
    use crate::error::NETWORK_ERROR_MESSAGE;
    use crate::notify::RecordingNotifier;
    use crate::session::MemorySessionStore;
    use qkart_core::session_keys;
    use rust_decimal::Decimal;

    struct Harness {
        service: AuthService,
        backend: Arc<FakeBackend>,
        session: Arc<MemorySessionStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(backend: FakeBackend) -> Harness {
        let backend = Arc::new(backend);
        let session = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        Harness {
            service: AuthService::new(backend.clone(), session.clone(), notifier.clone()),
            backend,
            session,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let h = harness(FakeBackend::default());
        h.service
            .register(&RegisterForm::new("crio.do", "learnbydoing", "learnbydoing"))
            .await
            .unwrap();

        assert_eq!(h.backend.calls(), vec!["register:crio.do"]);
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::success("Registered successfully")]
        );
    }

    #[tokio::test]
    async fn test_register_invalid_form_skips_backend() {
        let h = harness(FakeBackend::default());
        let err = h
            .service
            .register(&RegisterForm::new("crio.do", "learnbydoing", "learnbydoinG"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorefrontError::Validation(_)));
        assert!(h.backend.calls().is_empty());
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::warning("Passwords do not match")]
        );
    }

    #[tokio::test]
    async fn test_register_taken_username() {
        let h = harness(FakeBackend::default().with_user("crio.do", "learnbydoing"));
        let err = h
            .service
            .register(&RegisterForm::new("crio.do", "learnbydoing", "learnbydoing"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorefrontError::Auth(ref m) if m == "Username is already taken"));
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::error("Username is already taken")]
        );
    }

    #[tokio::test]
    async fn test_register_backend_down() {
        let h = harness(FakeBackend {
            offline: true,
            ..FakeBackend::default()
        });
        let err = h
            .service
            .register(&RegisterForm::new("crio.do", "learnbydoing", "learnbydoing"))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::error(NETWORK_ERROR_MESSAGE)]
        );
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let h = harness(FakeBackend::default().with_user("crio.do", "learnbydoing"));
        let session = h
            .service
            .login(&LoginForm::new("crio.do", "learnbydoing"))
            .await
            .unwrap();

        assert_eq!(session.username, "crio.do");
        assert_eq!(
            h.session.get(session_keys::TOKEN).unwrap().as_deref(),
            Some(VALID_TOKEN)
        );
        assert_eq!(
            h.session.get(session_keys::BALANCE).unwrap().as_deref(),
            Some("5000")
        );

        let current = h.service.current_session().unwrap().unwrap();
        assert_eq!(current.balance, Decimal::from(5000));
        assert_eq!(
            h.notifier.notifications(),
            vec![Notification::success("Logged in successfully")]
        );
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let h = harness(FakeBackend::default().with_user("crio.do", "learnbydoing"));
        let err = h
            .service
            .login(&LoginForm::new("crio.do", "wrongpassword"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorefrontError::Auth(ref m) if m == "Password is incorrect"));
        assert!(h.service.current_session().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_missing_password() {
        let h = harness(FakeBackend::default());
        let err = h
            .service
            .login(&LoginForm::new("crio.do", ""))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StorefrontError::Validation(qkart_core::ValidationError::PasswordRequired)
        ));
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let h = harness(FakeBackend::default().with_user("crio.do", "learnbydoing"));
        h.service
            .login(&LoginForm::new("crio.do", "learnbydoing"))
            .await
            .unwrap();
        h.notifier.take();

        h.service.logout().unwrap();

        assert!(h.service.current_session().unwrap().is_none());
        assert_eq!(h.notifier.notifications(), vec![Notification::info("Logged out")]);
    }

    #[test]
    fn test_rejection_fallback() {
        let err = rejection(
            BackendError::Rejected {
                status: 400,
                message: String::new(),
            },
            REGISTER_REJECTED_MESSAGE,
        );
        assert!(matches!(err, StorefrontError::Auth(ref m) if m == REGISTER_REJECTED_MESSAGE));
    }
}

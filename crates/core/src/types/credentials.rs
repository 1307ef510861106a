//! Login and registration form types.
//!
//! Validation runs before any network call; the first failing rule is
//! reported and its message is shown to the user verbatim.

use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

/// Minimum length for usernames and passwords at registration.
pub const MIN_CREDENTIAL_LENGTH: usize = 6;

/// Errors raised when user input fails a required-field or format rule.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("Username is a required field")]
    UsernameRequired,
    /// Username is shorter than [`MIN_CREDENTIAL_LENGTH`].
    #[error("Username must be at least 6 characters")]
    UsernameTooShort,
    /// Password is empty.
    #[error("Password is a required field")]
    PasswordRequired,
    /// Password is shorter than [`MIN_CREDENTIAL_LENGTH`].
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Validated username/password pair sent to `/auth/login` and `/auth/register`.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

/// Raw login form input.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginForm {
    /// Create a login form.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check required fields and produce credentials.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: username required, then password
    /// required.
    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::UsernameRequired);
        }
        if self.password.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(Credentials {
            username: self.username.clone(),
            password: SecretString::from(self.password.clone()),
        })
    }
}

/// Raw registration form input.
#[derive(Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

impl RegisterForm {
    /// Create a registration form.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Check every registration rule and produce credentials.
    ///
    /// # Errors
    ///
    /// Rules are checked in order: username required, username length,
    /// password required, password length, confirmation match.
    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::UsernameRequired);
        }
        if self.username.chars().count() < MIN_CREDENTIAL_LENGTH {
            return Err(ValidationError::UsernameTooShort);
        }
        if self.password.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        if self.password.chars().count() < MIN_CREDENTIAL_LENGTH {
            return Err(ValidationError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(Credentials {
            username: self.username.clone(),
            password: SecretString::from(self.password.clone()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_username() {
        let form = LoginForm::new("", "secret");
        assert_eq!(form.validate().unwrap_err(), ValidationError::UsernameRequired);
    }

    #[test]
    fn test_login_requires_password() {
        let form = LoginForm::new("criodo", "");
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordRequired);
    }

    #[test]
    fn test_login_does_not_check_length() {
        assert!(LoginForm::new("ab", "cd").validate().is_ok());
    }

    #[test]
    fn test_register_rule_order() {
        let cases = [
            (RegisterForm::new("", "", ""), ValidationError::UsernameRequired),
            (RegisterForm::new("abc", "", ""), ValidationError::UsernameTooShort),
            (RegisterForm::new("criodo", "", ""), ValidationError::PasswordRequired),
            (RegisterForm::new("criodo", "abc", "abc"), ValidationError::PasswordTooShort),
            (
                RegisterForm::new("criodo", "learnwithcrio", "learnwithcrio!"),
                ValidationError::PasswordMismatch,
            ),
        ];

        for (form, expected) in cases {
            assert_eq!(form.validate().unwrap_err(), expected, "{form:?}");
        }
    }

    #[test]
    fn test_register_valid() {
        let creds = RegisterForm::new("criodo", "learnwithcrio", "learnwithcrio")
            .validate()
            .unwrap();
        assert_eq!(creds.username, "criodo");
        assert_eq!(creds.password.expose_secret(), "learnwithcrio");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::UsernameTooShort.to_string(),
            "Username must be at least 6 characters"
        );
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_credentials_serialize_for_backend() {
        let creds = LoginForm::new("criodo", "learnwithcrio").validate().unwrap();
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"username": "criodo", "password": "learnwithcrio"})
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = LoginForm::new("criodo", "learnwithcrio").validate().unwrap();
        let debug_output = format!("{creds:?}");
        assert!(debug_output.contains("criodo"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("learnwithcrio"));
    }
}

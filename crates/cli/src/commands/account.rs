//! Registration, login and session inspection.

use std::io;

use qkart_core::{LoginForm, RegisterForm};
use qkart_storefront::Storefront;

use crate::CliError;
use crate::render;

/// Create an account.
pub async fn register(
    storefront: &Storefront,
    username: String,
    password: String,
    confirm: String,
) -> Result<(), CliError> {
    let form = RegisterForm {
        username,
        password,
        confirm_password: confirm,
    };
    storefront.auth().register(&form).await?;
    Ok(())
}

/// Log in and persist the session.
pub async fn login(
    storefront: &Storefront,
    username: String,
    password: String,
) -> Result<(), CliError> {
    let form = LoginForm { username, password };
    let session = storefront.auth().login(&form).await?;
    render::session(&mut io::stdout().lock(), Some(&session))?;
    Ok(())
}

/// Forget the saved session.
pub fn logout(storefront: &Storefront) -> Result<(), CliError> {
    storefront.auth().logout()?;
    Ok(())
}

/// Print the logged-in user.
pub fn whoami(storefront: &Storefront) -> Result<(), CliError> {
    let session = storefront.auth().current_session()?;
    render::session(&mut io::stdout().lock(), session.as_ref())?;
    Ok(())
}

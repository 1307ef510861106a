//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and logout against the backend
//! - `cart` - Catalog and cart state with optimistic quantity changes
//!
//! Each user action reports its outcome exactly once through the
//! [`Notifier`] handed to the service.

pub mod auth;
pub mod cart;

pub use auth::AuthService;
pub use cart::{AddToCart, CartService};

use tracing::warn;

use crate::error::StorefrontError;
use crate::notify::{Notification, Notifier};

/// Notify the user about a failed action and hand the error back.
pub(crate) fn report(notifier: &dyn Notifier, err: StorefrontError) -> StorefrontError {
    let message = err.user_message();
    let notification = match err {
        StorefrontError::Validation(_) | StorefrontError::NotLoggedIn => {
            Notification::warning(message)
        }
        _ => {
            warn!(error = %err, "Storefront action failed");
            Notification::error(message)
        }
    };
    notifier.notify(notification);
    err
}

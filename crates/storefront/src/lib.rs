//! QKart storefront client library.
//!
//! Everything the storefront does on top of the pure cart logic in
//! `qkart-core`: talking to the REST backend, keeping the login session,
//! debounced search and the auth and cart services that tie them together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod search;
pub mod services;
pub mod session;
pub mod state;

pub use backend::{Backend, BackendClient, BackendError};
pub use config::{ClientConfig, ConfigError, SentryConfig};
pub use error::{Result, StorefrontError};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use search::{Debouncer, SearchController, SearchState};
pub use services::{AddToCart, AuthService, CartService};
pub use session::{FileSessionStore, MemorySessionStore, SessionError, SessionStore};
pub use state::Storefront;

//! Core types for QKart.
//!
//! This module provides type-safe wrappers for the storefront's domain
//! concepts.

pub mod cart;
pub mod credentials;
pub mod id;
pub mod price;
pub mod product;
pub mod session;

pub use cart::{CartLineItem, CartRecord};
pub use credentials::{Credentials, LoginForm, RegisterForm, ValidationError};
pub use id::*;
pub use price::format_amount;
pub use product::Product;
pub use session::{AuthToken, LoginResponse, UserSession, keys as session_keys};

//! QKart Core - Shared types and cart reconciliation.
//!
//! This crate provides the types used across all QKart components:
//! - `storefront` - Backend client, session store, search and cart services
//! - `cli` - Command-line storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage access. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, cart records, credentials and session values
//! - [`cart`] - Reconciliation of backend cart records against the catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    CartSummary, apply_quantity_change, is_duplicate, item_count, reconcile, total_value,
};
pub use types::*;

//! Cache types for catalog responses.

use std::sync::Arc;

use qkart_core::Product;

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Search(String),
}

/// Cached product list, shared between readers.
pub type CacheValue = Arc<Vec<Product>>;

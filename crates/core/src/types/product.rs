//! Catalog product type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::deserialize_lenient;

/// Highest rating a product can display.
pub const MAX_RATING: f64 = 5.0;

/// A product available to buy, as returned by `GET /products`.
///
/// Owned by the catalog backend and read-only to the storefront. Only `id`
/// and `cost` matter to cart reconciliation; the rest is display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique ID within a catalog snapshot.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Name or title of the product.
    #[serde(default)]
    pub name: String,
    /// Category the product belongs to.
    #[serde(default)]
    pub category: String,
    /// Price to buy one unit. `None` when the backend sent a missing or
    /// non-numeric value.
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub cost: Option<Decimal>,
    /// Aggregate rating out of five.
    #[serde(default)]
    pub rating: f64,
    /// URL of the product image.
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Create a product with the fields reconciliation cares about.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, cost: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            cost: Some(cost),
            rating: 0.0,
            image: String::new(),
        }
    }

    /// Unit cost used for totals.
    ///
    /// Missing or negative costs count as zero.
    #[must_use]
    pub fn effective_cost(&self) -> Decimal {
        match self.cost {
            Some(cost) if cost >= Decimal::ZERO => cost,
            _ => Decimal::ZERO,
        }
    }

    /// Rating clamped to `[0, 5]`, with non-finite values treated as 0.
    #[must_use]
    pub fn rating_stars(&self) -> f64 {
        if self.rating.is_finite() {
            self.rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        }
    }
}

//! Cart record and line item types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// A `(productId, qty)` pair as reported by `GET /cart` and `POST /cart`.
///
/// The backend owns these. A record may reference a product that is no
/// longer in the catalog, and a record with `qty <= 0` is logically absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartRecord {
    /// Product this record refers to.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Quantity in the cart.
    pub qty: i64,
}

impl CartRecord {
    /// Create a new cart record.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, qty: i64) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }

    /// Whether this record represents something actually in the cart.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.qty > 0
    }
}

/// A cart record enriched with its resolved product.
///
/// Only produced by [`crate::cart::reconcile`], which guarantees `qty > 0`
/// and one item per product id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineItem {
    /// The resolved catalog product.
    pub product: Product,
    /// Quantity carried over from the cart record.
    pub qty: i64,
}

impl CartLineItem {
    /// Cost of this line (`effective_cost * qty`).
    ///
    /// Returns zero if the multiplication would overflow.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .effective_cost()
            .checked_mul(Decimal::from(self.qty))
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_cart_response() {
        let json = r#"[
            {"productId": "KCRwjF7lN97HnEaY", "qty": 3},
            {"productId": "BW0jAAeDJmlZCF8i", "qty": 1}
        ]"#;

        let records: Vec<CartRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(
            records,
            vec![
                CartRecord::new("KCRwjF7lN97HnEaY", 3),
                CartRecord::new("BW0jAAeDJmlZCF8i", 1),
            ]
        );
    }

    #[test]
    fn test_serialize_uses_backend_field_names() {
        let json = serde_json::to_value(CartRecord::new("abc", 2)).unwrap();
        assert_eq!(json, serde_json::json!({"productId": "abc", "qty": 2}));
    }

    #[test]
    fn test_is_active() {
        assert!(CartRecord::new("a", 1).is_active());
        assert!(!CartRecord::new("a", 0).is_active());
        assert!(!CartRecord::new("a", -2).is_active());
    }

    #[test]
    fn test_line_total() {
        let item = CartLineItem {
            product: Product::new("a", "X", Decimal::new(2550, 2)),
            qty: 2,
        };
        assert_eq!(item.line_total(), Decimal::new(5100, 2));
    }

    #[test]
    fn test_line_total_missing_cost() {
        let mut product = Product::new("a", "X", Decimal::ONE);
        product.cost = None;
        let item = CartLineItem { product, qty: 4 };
        assert_eq!(item.line_total(), Decimal::ZERO);
    }
}

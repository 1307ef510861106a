//! Cart reconciliation.
//!
//! The backend reports the cart as a list of `(productId, qty)` records and
//! the catalog separately as a list of products. Everything the storefront
//! shows about the cart is a projection of those two lists, recomputed after
//! every backend call and never mutated in place.
//!
//! All functions here are pure and total: they take borrowed inputs, return
//! freshly built values and never fail.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CartLineItem, CartRecord, Product, ProductId};

/// Join cart records against the catalog.
///
/// - Records with `qty <= 0` are skipped.
/// - Records whose product is not in the catalog are silently dropped.
/// - Output follows the order of `records`, not the catalog.
/// - If the same product appears in several active records, the first one
///   wins.
#[must_use]
pub fn reconcile(records: &[CartRecord], catalog: &[Product]) -> Vec<CartLineItem> {
    if records.is_empty() || catalog.is_empty() {
        return Vec::new();
    }

    let index: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();
    let mut seen: HashSet<&ProductId> = HashSet::with_capacity(records.len());

    records
        .iter()
        .filter(|record| record.is_active())
        .filter_map(|record| {
            let product = index.get(&record.product_id)?;
            seen.insert(&record.product_id).then(|| CartLineItem {
                product: (*product).clone(),
                qty: record.qty,
            })
        })
        .collect()
}

/// Sum of `cost * qty` over all line items.
///
/// Items with a missing or negative cost contribute zero. An item whose line
/// total would overflow the running sum is skipped.
#[must_use]
pub fn total_value(line_items: &[CartLineItem]) -> Decimal {
    line_items.iter().fold(Decimal::ZERO, |total, item| {
        total.checked_add(item.line_total()).unwrap_or(total)
    })
}

/// Total number of units across all line items.
#[must_use]
pub fn item_count(line_items: &[CartLineItem]) -> i64 {
    line_items
        .iter()
        .fold(0_i64, |count, item| count.saturating_add(item.qty))
}

/// Whether the cart already tracks `product_id`.
///
/// Quantity is ignored: a stale zero-qty record still counts, so a second
/// distinct entry for the same product is never created.
#[must_use]
pub fn is_duplicate(records: &[CartRecord], product_id: &ProductId) -> bool {
    records.iter().any(|record| &record.product_id == product_id)
}

/// Stage a quantity change locally.
///
/// Returns a new list; `records` is left untouched.
/// - `new_qty <= 0` removes every record for `product_id`.
/// - Otherwise the first record for `product_id` takes `new_qty` (any later
///   records for it are dropped), or a record is appended if none exists.
///
/// The result is only the expected post-mutation view. Whatever the backend
/// returns from the mutation replaces it.
#[must_use]
pub fn apply_quantity_change(
    records: &[CartRecord],
    product_id: &ProductId,
    new_qty: i64,
) -> Vec<CartRecord> {
    let mut staged: Vec<CartRecord> = records
        .iter()
        .filter(|record| &record.product_id != product_id)
        .cloned()
        .collect();

    if new_qty <= 0 {
        return staged;
    }

    let updated = CartRecord::new(product_id.clone(), new_qty);
    match records.iter().position(|r| &r.product_id == product_id) {
        Some(first) => {
            // Number of surviving records that came before the first match.
            let insert_at = records
                .iter()
                .take(first)
                .filter(|r| &r.product_id != product_id)
                .count();
            staged.insert(insert_at, updated);
        }
        None => staged.push(updated),
    }
    staged
}

/// Everything the cart view needs, derived in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
    /// Resolved line items in backend order.
    pub items: Vec<CartLineItem>,
    /// Sum of line totals.
    pub total: Decimal,
    /// Total units in the cart.
    pub item_count: i64,
}

impl CartSummary {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Decimal::ZERO,
            item_count: 0,
        }
    }

    /// Reconcile `records` against `catalog` and compute totals.
    #[must_use]
    pub fn from_parts(records: &[CartRecord], catalog: &[Product]) -> Self {
        let items = reconcile(records, catalog);
        let total = total_value(&items);
        let item_count = item_count(&items);
        Self {
            items,
            total,
            item_count,
        }
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a wallet `balance` covers the cart total.
    #[must_use]
    pub fn can_afford(&self, balance: Decimal) -> bool {
        balance >= self.total
    }
}

impl Default for CartSummary {
    fn default() -> Self {
        Self::empty()
    }
}

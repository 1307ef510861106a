//! # Property-Based Tests
//!
//! Invariants of cart reconciliation checked with proptest.

use std::collections::HashSet;

use proptest::collection::vec;
use proptest::prelude::*;
use qkart_core::{
    CartRecord, Product, ProductId, apply_quantity_change, is_duplicate, reconcile, total_value,
};
use rust_decimal::Decimal;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Small id space so records and catalog overlap often.
fn product_id() -> impl Strategy<Value = String> {
    "[a-f]"
}

fn record() -> impl Strategy<Value = CartRecord> {
    (product_id(), -2i64..6).prop_map(|(id, qty)| CartRecord::new(id, qty))
}

fn catalog() -> impl Strategy<Value = Vec<Product>> {
    vec((product_id(), 0i64..1000), 0..6).prop_map(|entries| {
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|(id, _)| seen.insert(id.clone()))
            .map(|(id, cost)| Product::new(id.as_str(), id.as_str(), Decimal::from(cost)))
            .collect()
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// No two line items share a product id.
    #[test]
    fn reconcile_never_duplicates(records in vec(record(), 0..20), catalog in catalog()) {
        let items = reconcile(&records, &catalog);
        let mut ids = HashSet::new();
        for item in &items {
            prop_assert!(ids.insert(item.product.id.clone()));
        }
    }

    /// Every line item has a positive quantity.
    #[test]
    fn reconcile_only_positive_qty(records in vec(record(), 0..20), catalog in catalog()) {
        for item in reconcile(&records, &catalog) {
            prop_assert!(item.qty > 0);
        }
    }

    /// Empty records or empty catalog always reconcile to nothing.
    #[test]
    fn reconcile_empty_sides(records in vec(record(), 0..20), catalog in catalog()) {
        prop_assert!(reconcile(&[], &catalog).is_empty());
        prop_assert!(reconcile(&records, &[]).is_empty());
    }

    /// Total equals the manual sum over resolving, active, first-seen records.
    #[test]
    fn total_matches_manual_sum(records in vec(record(), 0..20), catalog in catalog()) {
        let mut seen = HashSet::new();
        let mut expected = Decimal::ZERO;
        for r in records.iter().filter(|r| r.qty > 0) {
            if let Some(p) = catalog.iter().find(|p| p.id == r.product_id)
                && seen.insert(r.product_id.clone())
            {
                expected += p.effective_cost() * Decimal::from(r.qty);
            }
        }
        prop_assert_eq!(total_value(&reconcile(&records, &catalog)), expected);
    }

    /// Duplicate detection is presence only.
    #[test]
    fn is_duplicate_is_presence(records in vec(record(), 0..20), id in product_id()) {
        let id = ProductId::new(id);
        let expected = records.iter().any(|r| r.product_id == id);
        prop_assert_eq!(is_duplicate(&records, &id), expected);
    }

    /// Removal drops every entry and is idempotent.
    #[test]
    fn removal_is_idempotent(
        records in vec(record(), 0..20),
        id in product_id(),
        qty in -3i64..=0,
    ) {
        let id = ProductId::new(id);
        let once = apply_quantity_change(&records, &id, qty);
        prop_assert!(!once.iter().any(|r| r.product_id == id));
        prop_assert_eq!(apply_quantity_change(&once, &id, 0), once);
    }

    /// Last write wins, nothing accumulates.
    #[test]
    fn last_write_wins(
        records in vec(record(), 0..20),
        id in product_id(),
        n in 1i64..10,
        m in -3i64..10,
    ) {
        let id = ProductId::new(id);
        let twice = apply_quantity_change(&apply_quantity_change(&records, &id, n), &id, m);
        prop_assert_eq!(twice, apply_quantity_change(&records, &id, m));
    }

    /// After a removal, a later write yields the same contents (the re-added
    /// record moves to the end).
    #[test]
    fn last_write_wins_after_removal(
        records in vec(record(), 0..20),
        id in product_id(),
        n in -3i64..=0,
        m in -3i64..10,
    ) {
        let id = ProductId::new(id);
        let mut twice = apply_quantity_change(&apply_quantity_change(&records, &id, n), &id, m);
        let mut direct = apply_quantity_change(&records, &id, m);
        twice.sort_by(|a, b| a.product_id.cmp(&b.product_id).then(a.qty.cmp(&b.qty)));
        direct.sort_by(|a, b| a.product_id.cmp(&b.product_id).then(a.qty.cmp(&b.qty)));
        prop_assert_eq!(twice, direct);
    }

    /// Positive changes leave exactly one record for the product.
    #[test]
    fn positive_change_leaves_single_record(
        records in vec(record(), 0..20),
        id in product_id(),
        qty in 1i64..10,
    ) {
        let id = ProductId::new(id);
        let staged = apply_quantity_change(&records, &id, qty);
        let matching: Vec<_> = staged.iter().filter(|r| r.product_id == id).collect();
        prop_assert_eq!(matching.len(), 1);
        prop_assert_eq!(matching[0].qty, qty);
    }
}

//! Reconciliation tests
//!
//! Tests for the validate → upsert → ledger-append sequence:
//! - Ledger accumulation: quantity equals the sum of appended deltas
//! - Validation failures leave no product and no ledger rows
//! - Snapshot idempotence across re-saves
//! - Batch sweeps commit per-row and survive single-row failures

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    InventoryAdjustment, ledger_sum, SubcategorySnapshot, REASON_STOCK_COUNT,
};
use shared::rules::{requires_flavor, requires_nicotine};
use shared::validation::{validate_add_qty, validate_brand, validate_sell_price};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// In-memory store simulation
// ============================================================================

/// A draft as the engine sees it after identity resolution.
#[derive(Debug, Clone)]
struct Draft {
    product_id: Option<Uuid>,
    barcode: String,
    name: String,
    category_name: String,
    subcategory: Option<SubcategorySnapshot>,
    flavor: Option<String>,
    nicotine_mg: Option<Decimal>,
    sell_price: Option<Decimal>,
    add_qty: i32,
}

impl Draft {
    fn new(barcode: &str) -> Self {
        Self {
            product_id: None,
            barcode: barcode.to_string(),
            name: "Vuse".to_string(),
            category_name: "Disposable Vapes".to_string(),
            subcategory: Some(SubcategorySnapshot::new("Pods", Some("Imperial".into()))),
            flavor: Some("Mint".to_string()),
            nicotine_mg: Some(dec("20")),
            sell_price: Some(dec("12.99")),
            add_qty: 0,
        }
    }

    fn with_qty(mut self, qty: i32) -> Self {
        self.add_qty = qty;
        self
    }
}

/// Stored product record in the simulated store.
#[derive(Debug, Clone)]
struct StoredProduct {
    barcode: String,
    subcategory: SubcategorySnapshot,
    flavor: Option<String>,
    nicotine_mg: Option<Decimal>,
    quantity: i64,
}

/// Simulated tenant store: products plus an append-only ledger. Mirrors
/// the ordering guarantees of the engine: upsert first, ledger second,
/// quantity recomputed from the ledger inside the append.
#[derive(Debug, Default)]
struct Store {
    products: HashMap<Uuid, StoredProduct>,
    ledger: Vec<InventoryAdjustment>,
    /// Barcodes whose ledger append is rigged to fail.
    ledger_fails_for: Vec<String>,
    /// Barcodes whose upsert is rigged to fail.
    upsert_fails_for: Vec<String>,
}

#[derive(Debug, PartialEq)]
enum SimError {
    Validation(&'static str),
    Persistence(&'static str),
    LedgerAppend,
}

impl Store {
    fn resolve(&self, barcode: &str) -> Option<(Uuid, StoredProduct)> {
        self.products
            .iter()
            .find(|(_, p)| p.barcode == barcode)
            .map(|(id, p)| (*id, p.clone()))
    }

    /// The engine sequence: validate, upsert, append.
    fn reconcile(&mut self, draft: &Draft) -> Result<Uuid, SimError> {
        // Ordered validation, short-circuiting.
        validate_brand(&draft.name).map_err(SimError::Validation)?;
        if draft.category_name.is_empty() {
            return Err(SimError::Validation("Category is required"));
        }
        let subcategory = draft
            .subcategory
            .clone()
            .ok_or(SimError::Validation("Subcategory is required"))?;
        validate_sell_price(draft.sell_price).map_err(SimError::Validation)?;
        validate_add_qty(draft.add_qty).map_err(SimError::Validation)?;

        // Attribute gating.
        let flavor = if requires_flavor(&draft.category_name) {
            draft.flavor.clone()
        } else {
            None
        };
        let nicotine_mg = if requires_nicotine(&subcategory.name) {
            draft.nicotine_mg
        } else {
            None
        };

        // Upsert; a failure here must leave the ledger untouched.
        if self.upsert_fails_for.contains(&draft.barcode) {
            return Err(SimError::Persistence("insert rejected"));
        }

        let product_id = match draft.product_id {
            Some(id) => {
                let product = self
                    .products
                    .get_mut(&id)
                    .ok_or(SimError::Persistence("product vanished"))?;
                product.subcategory = subcategory;
                product.flavor = flavor;
                product.nicotine_mg = nicotine_mg;
                id
            }
            None => {
                let id = Uuid::new_v4();
                self.products.insert(
                    id,
                    StoredProduct {
                        barcode: draft.barcode.clone(),
                        subcategory,
                        flavor,
                        nicotine_mg,
                        quantity: 0,
                    },
                );
                id
            }
        };

        // Ledger append plus quantity recompute, one transaction.
        if draft.add_qty > 0 {
            if self.ledger_fails_for.contains(&draft.barcode) {
                return Err(SimError::LedgerAppend);
            }
            self.ledger.push(InventoryAdjustment {
                id: Uuid::new_v4(),
                tenant_id: Uuid::nil(),
                product_id,
                qty_added: draft.add_qty,
                reason: REASON_STOCK_COUNT.to_string(),
                created_at: chrono::Utc::now(),
            });
            let sum = ledger_sum(self.ledger.iter().filter(|a| a.product_id == product_id));
            if let Some(product) = self.products.get_mut(&product_id) {
                product.quantity = sum;
            }
        }

        Ok(product_id)
    }

    /// The batch sweep: sequential, best-effort, per-row outcomes.
    fn reconcile_batch(&mut self, rows: &[Draft]) -> (Vec<Uuid>, Vec<usize>) {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if row.barcode.trim().is_empty() {
                continue;
            }
            let mut row = row.clone();
            row.product_id = self.resolve(&row.barcode).map(|(id, _)| id);
            match self.reconcile(&row) {
                Ok(id) => succeeded.push(id),
                Err(_) => failed.push(index),
            }
        }
        (succeeded, failed)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Two reconciliations accumulate: quantity == q1 + q2 with exactly
    /// two ledger rows summing to the same value
    #[test]
    fn test_ledger_accumulation() {
        let mut store = Store::default();

        let id = store.reconcile(&Draft::new("111").with_qty(4)).unwrap();

        let mut second = Draft::new("111").with_qty(6);
        second.product_id = Some(id);
        let id2 = store.reconcile(&second).unwrap();

        assert_eq!(id, id2);
        assert_eq!(store.products[&id].quantity, 10);
        assert_eq!(store.ledger.len(), 2);
        assert_eq!(ledger_sum(&store.ledger), 10);
    }

    /// An edit-only save (qty 0) appends nothing to the ledger
    #[test]
    fn test_edit_only_save_appends_nothing() {
        let mut store = Store::default();
        let id = store.reconcile(&Draft::new("111").with_qty(0)).unwrap();

        assert!(store.ledger.is_empty());
        assert_eq!(store.products[&id].quantity, 0);
    }

    /// A draft missing the sell price is rejected with no side effects
    #[test]
    fn test_missing_sell_price_is_pure_failure() {
        let mut store = Store::default();
        let mut draft = Draft::new("111").with_qty(5);
        draft.sell_price = None;

        let err = store.reconcile(&draft).unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        assert!(store.products.is_empty());
        assert!(store.ledger.is_empty());
    }

    /// A negative quantity is rejected before any write
    #[test]
    fn test_negative_qty_is_pure_failure() {
        let mut store = Store::default();
        let err = store.reconcile(&Draft::new("111").with_qty(-3)).unwrap_err();

        assert!(matches!(err, SimError::Validation(_)));
        assert!(store.products.is_empty());
        assert!(store.ledger.is_empty());
    }

    /// An upsert failure aborts before the ledger append: no orphan rows
    #[test]
    fn test_upsert_failure_leaves_no_orphan_ledger_rows() {
        let mut store = Store::default();
        store.upsert_fails_for.push("111".to_string());

        let err = store.reconcile(&Draft::new("111").with_qty(5)).unwrap_err();
        assert_eq!(err, SimError::Persistence("insert rejected"));
        assert!(store.ledger.is_empty());
    }

    /// A ledger failure after a successful upsert keeps the product but
    /// records no quantity — the distinct retryable case
    #[test]
    fn test_ledger_failure_keeps_product_without_quantity() {
        let mut store = Store::default();
        store.ledger_fails_for.push("111".to_string());

        let err = store.reconcile(&Draft::new("111").with_qty(5)).unwrap_err();
        assert_eq!(err, SimError::LedgerAppend);

        // Product saved, quantity not yet reflecting the delta.
        assert_eq!(store.products.len(), 1);
        assert!(store.ledger.is_empty());
        let product = store.products.values().next().unwrap();
        assert_eq!(product.quantity, 0);

        // Retry succeeds and records the delta exactly once.
        store.ledger_fails_for.clear();
        let (id, _) = store.resolve("111").unwrap();
        let mut retry = Draft::new("111").with_qty(5);
        retry.product_id = Some(id);
        store.reconcile(&retry).unwrap();
        assert_eq!(store.products[&id].quantity, 5);
        assert_eq!(store.ledger.len(), 1);
    }

    /// Re-saving with an unchanged subcategory choice keeps the snapshot
    /// pair byte-for-byte, even after the live row's supplier changed
    #[test]
    fn test_resave_preserves_snapshot() {
        let mut store = Store::default();
        let id = store.reconcile(&Draft::new("111").with_qty(1)).unwrap();
        let original = store.products[&id].subcategory.clone();

        // The live subcategory row was renamed since; the operator
        // re-saves without re-picking, so the draft still carries the
        // stored pair.
        let mut resave = Draft::new("111").with_qty(2);
        resave.product_id = Some(id);
        resave.subcategory = Some(original.clone());
        store.reconcile(&resave).unwrap();

        assert_eq!(store.products[&id].subcategory, original);
        assert_eq!(
            store.products[&id].subcategory,
            SubcategorySnapshot::new("Pods", Some("Imperial".into()))
        );
    }

    /// Attribute gating clears fields hidden by the taxonomy rules
    #[test]
    fn test_gated_attributes_cleared_for_non_vape_product() {
        let mut store = Store::default();
        let mut draft = Draft::new("222").with_qty(1);
        draft.category_name = "Cigarettes".to_string();
        draft.subcategory = Some(SubcategorySnapshot::new("King Size", Some("Imperial".into())));

        let id = store.reconcile(&draft).unwrap();
        assert_eq!(store.products[&id].flavor, None);
        assert_eq!(store.products[&id].nicotine_mg, None);
    }

    /// Batch: row 4 of 10 fails, all other rows commit; re-running only
    /// row 4 succeeds without duplicating the rest
    #[test]
    fn test_batch_partial_failure_and_retry() {
        let mut store = Store::default();
        let rows: Vec<Draft> = (0..10)
            .map(|i| Draft::new(&format!("bc-{}", i)).with_qty(1))
            .collect();

        // Row index 3 ("bc-3") is rigged to fail persistence.
        store.upsert_fails_for.push("bc-3".to_string());
        let (succeeded, failed) = store.reconcile_batch(&rows);

        assert_eq!(succeeded.len(), 9);
        assert_eq!(failed, vec![3]);
        assert_eq!(store.products.len(), 9);
        assert_eq!(store.ledger.len(), 9);

        // Re-run with only the failed row.
        store.upsert_fails_for.clear();
        let (succeeded, failed) = store.reconcile_batch(&rows[3..4]);
        assert_eq!(succeeded.len(), 1);
        assert!(failed.is_empty());
        assert_eq!(store.products.len(), 10);
        assert_eq!(store.ledger.len(), 10);
        assert_eq!(ledger_sum(&store.ledger), 10);
    }

    /// Batch rows with empty barcodes are skipped, not failed
    #[test]
    fn test_batch_skips_empty_barcodes() {
        let mut store = Store::default();
        let rows = vec![
            Draft::new("bc-1").with_qty(1),
            Draft::new("").with_qty(1),
            Draft::new("bc-2").with_qty(1),
        ];

        let (succeeded, failed) = store.reconcile_batch(&rows);
        assert_eq!(succeeded.len(), 2);
        assert!(failed.is_empty());
        assert_eq!(store.products.len(), 2);
    }

    /// A batch re-scanning the same barcode twice updates one product
    #[test]
    fn test_batch_same_barcode_accumulates_sequentially() {
        let mut store = Store::default();
        let rows = vec![
            Draft::new("bc-1").with_qty(2),
            Draft::new("bc-1").with_qty(3),
        ];

        let (succeeded, failed) = store.reconcile_batch(&rows);
        assert_eq!(succeeded.len(), 2);
        assert!(failed.is_empty());
        assert_eq!(store.products.len(), 1);

        let (id, _) = store.resolve("bc-1").unwrap();
        assert_eq!(store.products[&id].quantity, 5);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating positive quantity deltas
    fn qty_strategy() -> impl Strategy<Value = i32> {
        1i32..=500
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Quantity always equals the ledger sum after any sequence of
        /// reconciliations on one barcode
        #[test]
        fn prop_quantity_equals_ledger_sum(deltas in prop::collection::vec(qty_strategy(), 1..15)) {
            let mut store = Store::default();
            let mut product_id = None;

            for delta in &deltas {
                let mut draft = Draft::new("bc").with_qty(*delta);
                draft.product_id = product_id;
                let id = store.reconcile(&draft).unwrap();
                product_id = Some(id);
            }

            let id = product_id.unwrap();
            let expected: i64 = deltas.iter().map(|d| i64::from(*d)).sum();
            prop_assert_eq!(store.products[&id].quantity, expected);
            prop_assert_eq!(store.ledger.len(), deltas.len());
            prop_assert_eq!(ledger_sum(&store.ledger), expected);
        }

        /// Edit-only saves interleaved anywhere never change the ledger sum
        #[test]
        fn prop_edit_only_saves_never_touch_the_ledger(
            deltas in prop::collection::vec(0i32..=100, 1..15)
        ) {
            let mut store = Store::default();
            let mut product_id = None;

            for delta in &deltas {
                let mut draft = Draft::new("bc").with_qty(*delta);
                draft.product_id = product_id;
                product_id = Some(store.reconcile(&draft).unwrap());
            }

            let positive_count = deltas.iter().filter(|d| **d > 0).count();
            let expected: i64 = deltas.iter().map(|d| i64::from(*d)).sum();
            prop_assert_eq!(store.ledger.len(), positive_count);
            prop_assert_eq!(ledger_sum(&store.ledger), expected);
        }

        /// A validation failure is always a no-op, wherever it lands in a
        /// sequence of saves
        #[test]
        fn prop_validation_failure_is_no_op(
            valid_before in 0usize..5,
            qty in qty_strategy()
        ) {
            let mut store = Store::default();
            let mut product_id = None;

            for _ in 0..valid_before {
                let mut draft = Draft::new("bc").with_qty(qty);
                draft.product_id = product_id;
                product_id = Some(store.reconcile(&draft).unwrap());
            }

            let products_before = store.products.len();
            let ledger_before = store.ledger.len();

            let mut invalid = Draft::new("bc").with_qty(qty);
            invalid.product_id = product_id;
            invalid.sell_price = None;
            prop_assert!(store.reconcile(&invalid).is_err());

            prop_assert_eq!(store.products.len(), products_before);
            prop_assert_eq!(store.ledger.len(), ledger_before);
        }

        /// Batch outcomes partition the non-empty rows: every row either
        /// succeeds or is reported, never silently dropped
        #[test]
        fn prop_batch_accounts_for_every_row(
            barcodes in prop::collection::vec("[a-z]{2,6}", 1..12),
            fail_index in any::<prop::sample::Index>()
        ) {
            let mut store = Store::default();
            let rows: Vec<Draft> = barcodes
                .iter()
                .map(|b| Draft::new(b).with_qty(1))
                .collect();

            let rigged = fail_index.get(&barcodes).clone();
            store.upsert_fails_for.push(rigged.clone());

            let (succeeded, failed) = store.reconcile_batch(&rows);
            prop_assert_eq!(succeeded.len() + failed.len(), rows.len());

            // Every reported failure is a rigged barcode.
            for index in &failed {
                prop_assert_eq!(&rows[*index].barcode, &rigged);
            }
        }
    }
}

//! Reconciliation engine
//!
//! The validate → upsert → ledger-append sequence behind every stock-count
//! save, plus the sequential best-effort batch variant. Validation is
//! ordered and short-circuits on the first failure; a validation failure
//! has no side effects. The product upsert always completes before the
//! ledger append is attempted, and a ledger failure after a successful
//! upsert is surfaced as a distinct retryable error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{map_unique_violation, AppError, AppResult};
use crate::services::identity::IdentityService;
use crate::services::ledger::LedgerService;
use shared::models::SubcategorySnapshot;
use shared::rules::{requires_flavor, requires_nicotine};
use shared::validation::{validate_add_qty, validate_barcode, validate_brand, validate_sell_price};

/// Reconciliation engine over the product catalog and quantity ledger
#[derive(Clone)]
pub struct ReconcileService {
    db: PgPool,
}

/// One stock-count save: a product draft plus a quantity delta.
///
/// `subcategory_id` is an explicit live pick and refreshes the stored
/// snapshot from the live row at save time. When absent, the
/// `subcategory_name`/`supplier_name` pair is preserved verbatim, which
/// keeps re-saves idempotent even after the live row was renamed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileInput {
    pub product_id: Option<Uuid>,
    pub barcode: String,
    /// Brand name.
    pub name: String,
    pub model: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub subcategory_name: Option<String>,
    pub supplier_name: Option<String>,
    pub size: Option<String>,
    pub flavor: Option<String>,
    pub nicotine_mg: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    #[serde(default)]
    pub add_qty: i32,
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub product_id: Uuid,
    pub created: bool,
    pub quantity: i32,
    /// Whether a ledger row was appended (false for edit-only saves).
    pub adjusted: bool,
}

/// Shared master attributes for a bulk entry sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkMaster {
    /// Brand name.
    pub name: String,
    pub model: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub sell_price: Option<Decimal>,
}

/// One row of a bulk entry sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRow {
    pub barcode: String,
    pub flavor: Option<String>,
    pub nicotine_mg: Option<Decimal>,
    #[serde(default)]
    pub add_qty: i32,
}

/// Input for a bulk entry sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkInput {
    pub master: BulkMaster,
    pub rows: Vec<BulkRow>,
}

/// Per-row success in a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    pub barcode: String,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Per-row failure in a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub barcode: String,
    pub error: String,
}

/// Aggregated outcome of a bulk entry sweep. Success is per-row; a failed
/// row never aborts the remainder.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total_rows: usize,
    pub skipped: usize,
    pub succeeded: Vec<RowOutcome>,
    pub failed: Vec<RowFailure>,
}

/// The attribute set actually persisted on a save.
///
/// Attributes hidden by the taxonomy rules are cleared even if previously
/// set, so a product never keeps stale irrelevant data.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPayload {
    pub name: String,
    pub model: Option<String>,
    pub category_id: Uuid,
    pub subcategory: SubcategorySnapshot,
    pub size: Option<String>,
    pub flavor: Option<String>,
    pub nicotine_mg: Option<Decimal>,
    pub sell_price: Option<Decimal>,
}

/// Ordered field validation, short-circuiting on the first failure.
/// Purely local: no data access, no side effects.
pub fn validate_input(input: &ReconcileInput) -> Result<(), AppError> {
    validate_barcode(&input.barcode).map_err(|msg| AppError::validation("barcode", msg))?;
    validate_brand(&input.name).map_err(|msg| AppError::validation("name", msg))?;

    if input.category_id.is_none() {
        return Err(AppError::validation("category_id", "Category is required"));
    }

    if input.subcategory_id.is_none() && input.subcategory_name.is_none() {
        return Err(AppError::validation(
            "subcategory",
            "Subcategory is required",
        ));
    }

    validate_sell_price(input.sell_price).map_err(|msg| AppError::validation("sell_price", msg))?;
    validate_add_qty(input.add_qty).map_err(|msg| AppError::validation("add_qty", msg))?;

    Ok(())
}

/// Build the persisted attribute set from a validated input.
///
/// The category name drives the flavor gate and the subcategory snapshot
/// name drives the nicotine gate.
pub fn build_payload(
    input: &ReconcileInput,
    category_id: Uuid,
    category_name: &str,
    subcategory: SubcategorySnapshot,
) -> ProductPayload {
    let flavor = if requires_flavor(category_name) {
        input.flavor.clone()
    } else {
        None
    };
    let nicotine_mg = if requires_nicotine(&subcategory.name) {
        input.nicotine_mg
    } else {
        None
    };

    ProductPayload {
        name: input.name.trim().to_string(),
        model: input.model.clone(),
        category_id,
        subcategory,
        size: input.size.clone(),
        flavor,
        nicotine_mg,
        sell_price: input.sell_price,
    }
}

impl ReconcileService {
    /// Create a new ReconcileService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Reconcile one draft: validate, persist the product, then record the
    /// quantity change in the ledger.
    pub async fn reconcile(
        &self,
        tenant_id: Uuid,
        input: ReconcileInput,
    ) -> AppResult<ReconcileOutcome> {
        validate_input(&input)?;

        // validate_input guarantees a category id is present
        let category_id = input.category_id.ok_or_else(|| {
            AppError::validation("category_id", "Category is required")
        })?;

        let category_name = sqlx::query_scalar::<_, String>(
            "SELECT name FROM categories WHERE id = $1 AND tenant_id = $2 AND is_active = TRUE",
        )
        .bind(category_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::validation("category_id", "Category not found for this tenant"))?;

        let subcategory = self
            .resolve_subcategory(tenant_id, category_id, &input)
            .await?;

        let payload = build_payload(&input, category_id, &category_name, subcategory);

        let (product_id, created, quantity) = match input.product_id {
            Some(id) => {
                let quantity = self.update_product(tenant_id, id, &input.barcode, &payload).await?;
                (id, false, quantity)
            }
            None => {
                let id = self.insert_product(tenant_id, &input.barcode, &payload).await?;
                (id, true, 0)
            }
        };

        // Edit-only saves append nothing to the ledger.
        if input.add_qty == 0 {
            return Ok(ReconcileOutcome {
                product_id,
                created,
                quantity,
                adjusted: false,
            });
        }

        let ledger = LedgerService::new(self.db.clone());
        let quantity = ledger
            .append_stock_count(tenant_id, product_id, input.add_qty)
            .await
            .map_err(|source| AppError::LedgerAppendFailed { product_id, source })?;

        Ok(ReconcileOutcome {
            product_id,
            created,
            quantity,
            adjusted: true,
        })
    }

    /// Run a bulk entry sweep: shared master attributes over an ordered
    /// row list, strictly sequential so two rows can never race on the
    /// same barcode. A row failure is reported and the sweep continues.
    pub async fn reconcile_batch(
        &self,
        tenant_id: Uuid,
        input: BulkInput,
    ) -> AppResult<BatchReport> {
        let identity = IdentityService::new(self.db.clone());

        let total_rows = input.rows.len();
        let mut skipped = 0;
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (index, row) in input.rows.into_iter().enumerate() {
            let barcode = row.barcode.trim().to_string();
            if barcode.is_empty() {
                skipped += 1;
                continue;
            }

            let result = self
                .reconcile_row(tenant_id, &identity, &input.master, &barcode, &row)
                .await;

            match result {
                Ok(outcome) => succeeded.push(RowOutcome {
                    row: index,
                    barcode,
                    product_id: outcome.product_id,
                    quantity: outcome.quantity,
                }),
                Err(err) => {
                    tracing::warn!(row = index, barcode = %barcode, error = %err, "Bulk entry row failed");
                    failed.push(RowFailure {
                        row: index,
                        barcode,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(BatchReport {
            total_rows,
            skipped,
            succeeded,
            failed,
        })
    }

    /// One row of a sweep: resolve identity, overlay the master
    /// attributes with the row's own optional fields, reconcile.
    async fn reconcile_row(
        &self,
        tenant_id: Uuid,
        identity: &IdentityService,
        master: &BulkMaster,
        barcode: &str,
        row: &BulkRow,
    ) -> AppResult<ReconcileOutcome> {
        let resolved = identity.resolve(tenant_id, barcode).await?;

        let input = ReconcileInput {
            product_id: resolved.draft.id,
            barcode: barcode.to_string(),
            name: master.name.clone(),
            model: master.model.clone(),
            category_id: master.category_id,
            subcategory_id: master.subcategory_id,
            subcategory_name: None,
            supplier_name: None,
            size: None,
            flavor: row.flavor.clone(),
            nicotine_mg: row.nicotine_mg,
            sell_price: master.sell_price,
            add_qty: row.add_qty,
        };

        self.reconcile(tenant_id, input).await
    }

    /// Determine the snapshot pair to persist: a live pick refreshes it
    /// from the current row, otherwise the pair in the request is kept
    /// verbatim.
    async fn resolve_subcategory(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        input: &ReconcileInput,
    ) -> AppResult<SubcategorySnapshot> {
        if let Some(subcategory_id) = input.subcategory_id {
            let row = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
                r#"
                SELECT category_id, name, supplier_name
                FROM subcategories
                WHERE id = $1 AND tenant_id = $2 AND is_active = TRUE
                "#,
            )
            .bind(subcategory_id)
            .bind(tenant_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::validation("subcategory_id", "Subcategory not found for this tenant")
            })?;

            let (parent_id, name, supplier_name) = row;
            if parent_id != category_id {
                return Err(AppError::validation(
                    "subcategory_id",
                    "Subcategory does not belong to the selected category",
                ));
            }

            return Ok(SubcategorySnapshot::new(name, supplier_name));
        }

        // validate_input guarantees the pair is present when no live pick
        // was made.
        let name = input.subcategory_name.clone().ok_or_else(|| {
            AppError::validation("subcategory", "Subcategory is required")
        })?;

        Ok(SubcategorySnapshot::new(name, input.supplier_name.clone()))
    }

    async fn insert_product(
        &self,
        tenant_id: Uuid,
        barcode: &str,
        payload: &ProductPayload,
    ) -> AppResult<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products
                (tenant_id, barcode, name, model, category_id,
                 subcategory_name, supplier_name, size, flavor, nicotine_mg,
                 sell_price, quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, TRUE)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(barcode)
        .bind(&payload.name)
        .bind(&payload.model)
        .bind(payload.category_id)
        .bind(&payload.subcategory.name)
        .bind(&payload.subcategory.supplier_name)
        .bind(&payload.size)
        .bind(&payload.flavor)
        .bind(payload.nicotine_mg)
        .bind(payload.sell_price)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "barcode"))?;

        Ok(id)
    }

    /// Update all mutable fields by id. The cached quantity is left to the
    /// ledger. Returns the current quantity.
    async fn update_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        barcode: &str,
        payload: &ProductPayload,
    ) -> AppResult<i32> {
        let quantity = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE products
            SET barcode = $3,
                name = $4,
                model = $5,
                category_id = $6,
                subcategory_name = $7,
                supplier_name = $8,
                size = $9,
                flavor = $10,
                nicotine_mg = $11,
                sell_price = $12,
                is_active = TRUE,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(barcode)
        .bind(&payload.name)
        .bind(&payload.model)
        .bind(payload.category_id)
        .bind(&payload.subcategory.name)
        .bind(&payload.subcategory.supplier_name)
        .bind(&payload.size)
        .bind(&payload.flavor)
        .bind(payload.nicotine_mg)
        .bind(payload.sell_price)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "barcode"))?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn complete_input() -> ReconcileInput {
        ReconcileInput {
            product_id: None,
            barcode: "0123456789012".to_string(),
            name: "Vuse".to_string(),
            model: Some("ePod 2".to_string()),
            category_id: Some(Uuid::new_v4()),
            subcategory_id: None,
            subcategory_name: Some("Pods".to_string()),
            supplier_name: Some("Imperial Tobacco".to_string()),
            size: Some("2ml".to_string()),
            flavor: Some("Mint".to_string()),
            nicotine_mg: Some(dec("20")),
            sell_price: Some(dec("12.99")),
            add_qty: 3,
        }
    }

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn complete_input_passes() {
        assert!(validate_input(&complete_input()).is_ok());
    }

    #[test]
    fn validation_order_short_circuits() {
        // Everything missing: brand is reported first (after barcode).
        let mut input = complete_input();
        input.name = String::new();
        input.category_id = None;
        input.subcategory_name = None;
        input.sell_price = None;
        assert_eq!(field_of(validate_input(&input).unwrap_err()), "name");

        // Brand present: category next.
        input.name = "Vuse".to_string();
        assert_eq!(field_of(validate_input(&input).unwrap_err()), "category_id");

        // Category present: subcategory next.
        input.category_id = Some(Uuid::new_v4());
        assert_eq!(field_of(validate_input(&input).unwrap_err()), "subcategory");

        // Subcategory present: price next.
        input.subcategory_name = Some("Pods".to_string());
        assert_eq!(field_of(validate_input(&input).unwrap_err()), "sell_price");
    }

    #[test]
    fn missing_sell_price_is_rejected() {
        let mut input = complete_input();
        input.sell_price = None;
        assert_eq!(field_of(validate_input(&input).unwrap_err()), "sell_price");
    }

    #[test]
    fn zero_qty_is_an_edit_only_save() {
        let mut input = complete_input();
        input.add_qty = 0;
        assert!(validate_input(&input).is_ok());
    }

    #[test]
    fn negative_qty_is_rejected() {
        let mut input = complete_input();
        input.add_qty = -2;
        assert_eq!(field_of(validate_input(&input).unwrap_err()), "add_qty");
    }

    #[test]
    fn live_pick_satisfies_subcategory_requirement() {
        let mut input = complete_input();
        input.subcategory_name = None;
        input.supplier_name = None;
        input.subcategory_id = Some(Uuid::new_v4());
        assert!(validate_input(&input).is_ok());
    }

    #[test]
    fn payload_keeps_flavor_and_nicotine_for_vape_taxonomy() {
        let input = complete_input();
        let category_id = input.category_id.unwrap();
        let snapshot = SubcategorySnapshot::new("Pods", Some("Imperial Tobacco".into()));

        let payload = build_payload(&input, category_id, "Disposable Vapes", snapshot);
        assert_eq!(payload.flavor.as_deref(), Some("Mint"));
        assert_eq!(payload.nicotine_mg, Some(dec("20")));
    }

    #[test]
    fn payload_clears_gated_attributes_for_other_taxonomy() {
        let input = complete_input();
        let category_id = input.category_id.unwrap();
        let snapshot = SubcategorySnapshot::new("Cigars", None);

        // A category that requires neither attribute clears both, even
        // though the draft carried values.
        let payload = build_payload(&input, category_id, "Cigarettes", snapshot);
        assert_eq!(payload.flavor, None);
        assert_eq!(payload.nicotine_mg, None);
    }

    #[test]
    fn payload_gates_attributes_independently() {
        let input = complete_input();
        let category_id = input.category_id.unwrap();

        // Flavor-bearing category with a nicotine-free subcategory.
        let snapshot = SubcategorySnapshot::new("Coils", Some("SMOK".into()));
        let payload = build_payload(&input, category_id, "Vape Hardware", snapshot);
        assert_eq!(payload.flavor.as_deref(), Some("Mint"));
        assert_eq!(payload.nicotine_mg, None);
    }

    #[test]
    fn payload_trims_brand() {
        let mut input = complete_input();
        input.name = "  Vuse  ".to_string();
        let category_id = input.category_id.unwrap();
        let snapshot = SubcategorySnapshot::new("Pods", None);

        let payload = build_payload(&input, category_id, "Vapes", snapshot);
        assert_eq!(payload.name, "Vuse");
    }
}

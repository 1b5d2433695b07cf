//! Quantity ledger
//!
//! Append-only record of quantity changes. The ledger is the write model;
//! `products.quantity` is a derived cache recomputed from the ledger sum
//! in the same transaction as every append.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{InventoryAdjustment, REASON_STOCK_COUNT};

/// Ledger service over the adjustment table
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Database row for a ledger entry
#[derive(Debug, sqlx::FromRow)]
struct AdjustmentRow {
    id: Uuid,
    tenant_id: Uuid,
    product_id: Uuid,
    qty_added: i32,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<AdjustmentRow> for InventoryAdjustment {
    fn from(r: AdjustmentRow) -> Self {
        InventoryAdjustment {
            id: r.id,
            tenant_id: r.tenant_id,
            product_id: r.product_id,
            qty_added: r.qty_added,
            reason: r.reason,
            created_at: r.created_at,
        }
    }
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append a stock-count adjustment and refresh the cached quantity.
    ///
    /// Both writes happen in one transaction so the cache can never drift
    /// from the ledger it is derived from. Returns the new quantity.
    ///
    /// Errors are returned raw so the reconciliation engine can surface
    /// them as a distinct retryable failure: at this point the product
    /// upsert has already committed.
    pub async fn append_stock_count(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        qty_added: i32,
    ) -> Result<i32, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_adjustments (tenant_id, product_id, qty_added, reason)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(qty_added)
        .bind(REASON_STOCK_COUNT)
        .execute(&mut *tx)
        .await?;

        let quantity = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE products
            SET quantity = (
                    SELECT COALESCE(SUM(qty_added), 0)::INT
                    FROM inventory_adjustments
                    WHERE product_id = $1
                ),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING quantity
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(quantity)
    }

    /// Ledger history for a product, oldest first.
    pub async fn history(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<InventoryAdjustment>> {
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT id, tenant_id, product_id, qty_added, reason, created_at
            FROM inventory_adjustments
            WHERE tenant_id = $1 AND product_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(InventoryAdjustment::from).collect())
    }
}

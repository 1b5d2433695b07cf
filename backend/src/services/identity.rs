//! Product identity resolution
//!
//! Maps a scanned barcode to a product draft. A miss is a normal outcome
//! (the start of a new product), not an error.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{Product, ProductDraft};

/// Identity resolver over the tenant's product catalog
#[derive(Clone)]
pub struct IdentityService {
    db: PgPool,
}

/// Database row for a product
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub barcode: String,
    pub name: String,
    pub model: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_name: Option<String>,
    pub supplier_name: Option<String>,
    pub size: Option<String>,
    pub flavor: Option<String>,
    pub nicotine_mg: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            tenant_id: r.tenant_id,
            barcode: r.barcode,
            name: r.name,
            model: r.model,
            category_id: r.category_id,
            subcategory_name: r.subcategory_name,
            supplier_name: r.supplier_name,
            size: r.size,
            flavor: r.flavor,
            nicotine_mg: r.nicotine_mg,
            sell_price: r.sell_price,
            quantity: r.quantity,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Outcome of resolving a scanned barcode.
///
/// `matched_subcategory_id` re-matches the stored snapshot pair against
/// the live taxonomy so a client can pre-select the dropdown row. It is a
/// convenience only — the snapshot pair stays authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedIdentity {
    pub draft: ProductDraft,
    pub existing: bool,
    pub matched_subcategory_id: Option<Uuid>,
}

impl IdentityService {
    /// Create a new IdentityService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve a barcode to a draft of the stored product, or a blank
    /// draft carrying only the barcode when nothing matches.
    pub async fn resolve(&self, tenant_id: Uuid, barcode: &str) -> AppResult<ResolvedIdentity> {
        let stored = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, tenant_id, barcode, name, model, category_id,
                   subcategory_name, supplier_name, size, flavor, nicotine_mg,
                   sell_price, quantity, is_active, created_at, updated_at
            FROM products
            WHERE tenant_id = $1 AND barcode = $2 AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(barcode)
        .fetch_optional(&self.db)
        .await?;

        let product = match stored {
            Some(row) => Product::from(row),
            None => {
                return Ok(ResolvedIdentity {
                    draft: ProductDraft::for_barcode(barcode),
                    existing: false,
                    matched_subcategory_id: None,
                })
            }
        };

        let matched_subcategory_id = match product.subcategory_snapshot() {
            Some(snapshot) => self
                .match_snapshot_to_live_row(tenant_id, &snapshot.name, snapshot.supplier_name.as_deref())
                .await?,
            None => None,
        };

        Ok(ResolvedIdentity {
            draft: ProductDraft::from(product),
            existing: true,
            matched_subcategory_id,
        })
    }

    /// Find the live subcategory row matching a stored snapshot pair.
    async fn match_snapshot_to_live_row(
        &self,
        tenant_id: Uuid,
        name: &str,
        supplier_name: Option<&str>,
    ) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM subcategories
            WHERE tenant_id = $1
              AND name = $2
              AND supplier_name IS NOT DISTINCT FROM $3
              AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(supplier_name)
        .fetch_optional(&self.db)
        .await?;

        Ok(id)
    }
}

//! HTTP handlers for product catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::InventoryAdjustment;
use crate::services::ledger::LedgerService;
use crate::AppState;

/// Completion options for the brand and model entry fields
#[derive(Debug, Serialize)]
pub struct ProductOptions {
    pub brands: Vec<String>,
    pub models: Vec<String>,
}

/// Distinct brand and model names across the tenant's active products
pub async fn product_options(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ProductOptions>> {
    let brands = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT name
        FROM products
        WHERE tenant_id = $1 AND is_active = TRUE AND name <> ''
        ORDER BY name ASC
        "#,
    )
    .bind(current_user.0.tenant_id)
    .fetch_all(&state.db)
    .await?;

    let models = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT model
        FROM products
        WHERE tenant_id = $1 AND is_active = TRUE AND model IS NOT NULL
        ORDER BY model ASC
        "#,
    )
    .bind(current_user.0.tenant_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ProductOptions { brands, models }))
}

/// Ledger history for one product, oldest first
pub async fn product_adjustments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryAdjustment>>> {
    let service = LedgerService::new(state.db);
    let history = service
        .history(current_user.0.tenant_id, product_id)
        .await?;
    Ok(Json(history))
}

/// Soft-deactivate a product. Products are never physically deleted; the
/// barcode becomes available for a fresh record.
pub async fn deactivate_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET is_active = FALSE, updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2 AND is_active = TRUE
        "#,
    )
    .bind(product_id)
    .bind(current_user.0.tenant_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product".to_string()));
    }

    Ok(Json(()))
}

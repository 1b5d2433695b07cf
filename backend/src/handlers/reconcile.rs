//! HTTP handlers for stock-count reconciliation endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reconcile::{
    BatchReport, BulkInput, ReconcileInput, ReconcileOutcome, ReconcileService,
};
use crate::AppState;

/// Reconcile a single product draft with a quantity change
pub async fn reconcile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReconcileInput>,
) -> AppResult<Json<ReconcileOutcome>> {
    let service = ReconcileService::new(state.db);
    let outcome = service.reconcile(current_user.0.tenant_id, input).await?;
    Ok(Json(outcome))
}

/// Run a bulk entry sweep over an ordered row list
pub async fn reconcile_bulk(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkInput>,
) -> AppResult<Json<BatchReport>> {
    let service = ReconcileService::new(state.db);
    let report = service
        .reconcile_batch(current_user.0.tenant_id, input)
        .await?;
    Ok(Json(report))
}

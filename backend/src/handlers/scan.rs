//! HTTP handler for the scan endpoint
//!
//! A scan signal carries a decoded code and its timestamp. The signal runs
//! through the operator's debouncer first; only accepted signals reach
//! identity resolution.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::ProductDraft;
use crate::services::identity::IdentityService;
use crate::AppState;
use shared::validation::validate_barcode;

/// One scan signal from the scanning device
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub code: String,
    /// Detection timestamp; defaults to arrival time.
    pub scanned_at: Option<DateTime<Utc>>,
}

/// Outcome of a scan signal
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    /// False when the signal was suppressed by the debouncer.
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<ProductDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_subcategory_id: Option<Uuid>,
}

/// Resolve a scanned barcode to a product draft
pub async fn scan_barcode(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ScanRequest>,
) -> AppResult<Json<ScanResponse>> {
    validate_barcode(&request.code).map_err(|msg| AppError::validation("code", msg))?;

    let at = request.scanned_at.unwrap_or_else(Utc::now);
    if !state.scan_gate.admit(current_user.0.user_id, at) {
        return Ok(Json(ScanResponse {
            accepted: false,
            draft: None,
            existing: None,
            matched_subcategory_id: None,
        }));
    }

    let service = IdentityService::new(state.db);
    let resolved = service
        .resolve(current_user.0.tenant_id, request.code.trim())
        .await?;

    Ok(Json(ScanResponse {
        accepted: true,
        existing: Some(resolved.existing),
        matched_subcategory_id: resolved.matched_subcategory_id,
        draft: Some(resolved.draft),
    }))
}

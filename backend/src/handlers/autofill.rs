//! HTTP handler for photo autofill

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::external::product_vision::{ExtractProductRequest, ProductSuggestions, VisionClient};
use crate::middleware::CurrentUser;
use crate::AppState;

/// Request carrying an encoded product photo
#[derive(Debug, Deserialize)]
pub struct AutofillRequest {
    pub image_base64: String,
}

/// Extract best-effort label suggestions from a product photo.
/// Suggestions only prefill the draft; the save is validated as usual.
pub async fn autofill(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(request): Json<AutofillRequest>,
) -> AppResult<Json<ProductSuggestions>> {
    let client = VisionClient::from_config(&state.config.vision)
        .ok_or_else(|| AppError::Configuration("Photo autofill is not configured".to_string()))?;

    let suggestions = client
        .extract_product(ExtractProductRequest {
            image_base64: request.image_base64,
        })
        .await?;

    Ok(Json(suggestions))
}

//! HTTP handlers for taxonomy endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Category, Subcategory};
use crate::services::taxonomy::{
    CategoryWithSubcategories, CreateCategoryInput, CreateSubcategoryInput, TaxonomyService,
};
use crate::AppState;

/// List the tenant's categories with subcategories nested
pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CategoryWithSubcategories>>> {
    let service = TaxonomyService::new(state.db);
    let categories = service
        .list_with_subcategories(current_user.0.tenant_id)
        .await?;
    Ok(Json(categories))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<Category>> {
    let service = TaxonomyService::new(state.db);
    let category = service
        .create_category(current_user.0.tenant_id, input)
        .await?;
    Ok(Json(category))
}

/// Create a subcategory
pub async fn create_subcategory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSubcategoryInput>,
) -> AppResult<Json<Subcategory>> {
    let service = TaxonomyService::new(state.db);
    let subcategory = service
        .create_subcategory(current_user.0.tenant_id, input)
        .await?;
    Ok(Json(subcategory))
}

/// List the subcategories under one category
pub async fn list_subcategories_for(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<Vec<Subcategory>>> {
    let service = TaxonomyService::new(state.db);
    let subcategories = service
        .subcategories_for(current_user.0.tenant_id, category_id)
        .await?;
    Ok(Json(subcategories))
}

//! Taxonomy store and resolver
//!
//! Loads a tenant's categories and subcategories once per session into an
//! in-memory snapshot with id and `(name, supplier_name)` pair indexes,
//! and provides the taxonomy administration operations.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{map_unique_violation, AppError, AppResult};
use shared::models::{Category, Subcategory, SubcategorySnapshot};
use shared::validation::validate_tax_rate;

/// Taxonomy service over the tenant-scoped reference tables
#[derive(Clone)]
pub struct TaxonomyService {
    db: PgPool,
}

/// Database row for a category
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    gst_rate: Decimal,
    pst_rate: Decimal,
    is_active: bool,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category {
            id: r.id,
            tenant_id: r.tenant_id,
            name: r.name,
            gst_rate: r.gst_rate,
            pst_rate: r.pst_rate,
            is_active: r.is_active,
        }
    }
}

/// Database row for a subcategory
#[derive(Debug, sqlx::FromRow)]
struct SubcategoryRow {
    id: Uuid,
    tenant_id: Uuid,
    category_id: Uuid,
    name: String,
    supplier_name: Option<String>,
    size_label: Option<String>,
    size_value: Option<String>,
    is_active: bool,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(r: SubcategoryRow) -> Self {
        Subcategory {
            id: r.id,
            tenant_id: r.tenant_id,
            category_id: r.category_id,
            name: r.name,
            supplier_name: r.supplier_name,
            size_label: r.size_label,
            size_value: r.size_value,
            is_active: r.is_active,
        }
    }
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub gst_rate: Decimal,
    pub pst_rate: Decimal,
}

/// Input for creating a subcategory
#[derive(Debug, Deserialize)]
pub struct CreateSubcategoryInput {
    pub category_id: Uuid,
    pub name: String,
    pub supplier_name: Option<String>,
    pub size_label: Option<String>,
    pub size_value: Option<String>,
}

/// A category with its subcategories, for listing
#[derive(Debug, Serialize)]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// In-memory view of one tenant's taxonomy.
///
/// Ordered by name (the display order), with lookups by id and by the
/// `(name, supplier_name)` pair used to re-match product snapshots.
#[derive(Debug, Clone)]
pub struct TaxonomySnapshot {
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    category_index: HashMap<Uuid, usize>,
    subcategory_index: HashMap<Uuid, usize>,
    pair_index: HashMap<(String, Option<String>), usize>,
}

impl TaxonomySnapshot {
    fn build(categories: Vec<Category>, subcategories: Vec<Subcategory>) -> Self {
        let category_index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();
        let subcategory_index = subcategories
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        let pair_index = subcategories
            .iter()
            .enumerate()
            .map(|(i, s)| ((s.name.clone(), s.supplier_name.clone()), i))
            .collect();

        Self {
            categories,
            subcategories,
            category_index,
            subcategory_index,
            pair_index,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.category_index.get(&id).map(|&i| &self.categories[i])
    }

    pub fn subcategory(&self, id: Uuid) -> Option<&Subcategory> {
        self.subcategory_index
            .get(&id)
            .map(|&i| &self.subcategories[i])
    }

    /// Ordered subcategories under one category.
    pub fn subcategories_for(&self, category_id: Uuid) -> Vec<&Subcategory> {
        self.subcategories
            .iter()
            .filter(|s| s.category_id == category_id)
            .collect()
    }

    /// Re-match a stored product snapshot to a live subcategory row.
    ///
    /// Returns `None` when the row was renamed or removed since the
    /// snapshot was taken; the snapshot itself stays valid either way.
    pub fn match_snapshot(&self, snapshot: &SubcategorySnapshot) -> Option<&Subcategory> {
        self.pair_index
            .get(&(snapshot.name.clone(), snapshot.supplier_name.clone()))
            .map(|&i| &self.subcategories[i])
    }
}

impl TaxonomyService {
    /// Create a new TaxonomyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load the tenant's active taxonomy into a snapshot.
    pub async fn load(&self, tenant_id: Uuid) -> AppResult<TaxonomySnapshot> {
        let categories = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, tenant_id, name, gst_rate, pst_rate, is_active
            FROM categories
            WHERE tenant_id = $1 AND is_active = TRUE
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        let subcategories = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            SELECT id, tenant_id, category_id, name, supplier_name,
                   size_label, size_value, is_active
            FROM subcategories
            WHERE tenant_id = $1 AND is_active = TRUE
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(TaxonomySnapshot::build(
            categories.into_iter().map(Category::from).collect(),
            subcategories.into_iter().map(Subcategory::from).collect(),
        ))
    }

    /// List categories with their subcategories nested.
    pub async fn list_with_subcategories(
        &self,
        tenant_id: Uuid,
    ) -> AppResult<Vec<CategoryWithSubcategories>> {
        let snapshot = self.load(tenant_id).await?;

        Ok(snapshot
            .categories()
            .iter()
            .map(|c| CategoryWithSubcategories {
                category: c.clone(),
                subcategories: snapshot
                    .subcategories_for(c.id)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    /// Ordered subcategories under one category, straight from the store.
    pub async fn subcategories_for(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> AppResult<Vec<Subcategory>> {
        let rows = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            SELECT id, tenant_id, category_id, name, supplier_name,
                   size_label, size_value, is_active
            FROM subcategories
            WHERE tenant_id = $1 AND category_id = $2 AND is_active = TRUE
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .bind(category_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    /// Create a new category.
    pub async fn create_category(
        &self,
        tenant_id: Uuid,
        input: CreateCategoryInput,
    ) -> AppResult<Category> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Category name is required"));
        }
        validate_tax_rate(input.gst_rate).map_err(|msg| AppError::validation("gst_rate", msg))?;
        validate_tax_rate(input.pst_rate).map_err(|msg| AppError::validation("pst_rate", msg))?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (tenant_id, name, gst_rate, pst_rate, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, tenant_id, name, gst_rate, pst_rate, is_active
            "#,
        )
        .bind(tenant_id)
        .bind(input.name.trim())
        .bind(input.gst_rate)
        .bind(input.pst_rate)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Create a new subcategory under an existing category.
    pub async fn create_subcategory(
        &self,
        tenant_id: Uuid,
        input: CreateSubcategoryInput,
    ) -> AppResult<Subcategory> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Subcategory name is required"));
        }

        // Parent must exist within the tenant
        let parent_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND tenant_id = $2 AND is_active = TRUE)",
        )
        .bind(input.category_id)
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        if !parent_exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        let row = sqlx::query_as::<_, SubcategoryRow>(
            r#"
            INSERT INTO subcategories
                (tenant_id, category_id, name, supplier_name, size_label, size_value, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, tenant_id, category_id, name, supplier_name,
                      size_label, size_value, is_active
            "#,
        )
        .bind(tenant_id)
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(&input.supplier_name)
        .bind(&input.size_label)
        .bind(&input.size_value)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "subcategory"))?;

        Ok(row.into())
    }
}

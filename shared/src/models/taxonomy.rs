//! Category and subcategory reference data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product category, owned by a tenant.
///
/// Carries the tax rates applied to products filed under it. Identity is
/// immutable once a product references the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub gst_rate: Decimal,
    pub pst_rate: Decimal,
    pub is_active: bool,
}

/// A subcategory belonging to exactly one category.
///
/// `name` need not be unique tenant-wide; the `(name, supplier_name)` pair
/// is the human identity used for display and for re-matching a product's
/// stored snapshot back to a live row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub supplier_name: Option<String>,
    pub size_label: Option<String>,
    pub size_value: Option<String>,
    pub is_active: bool,
}

impl Subcategory {
    /// The `(name, supplier_name)` pair recorded on products at save time.
    pub fn snapshot(&self) -> SubcategorySnapshot {
        SubcategorySnapshot {
            name: self.name.clone(),
            supplier_name: self.supplier_name.clone(),
        }
    }
}

/// Denormalized copy of the subcategory chosen when a product was saved.
///
/// Frozen at save time: later edits to the live subcategory row must not
/// rewrite it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategorySnapshot {
    pub name: String,
    pub supplier_name: Option<String>,
}

impl SubcategorySnapshot {
    pub fn new(name: impl Into<String>, supplier_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            supplier_name,
        }
    }
}

//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SubcategorySnapshot;

/// A catalog product.
///
/// `barcode` is unique among active products within a tenant.
/// `subcategory_name`/`supplier_name` are the snapshot pair frozen at save
/// time; `category_id` is the live taxonomy reference. `quantity` is a
/// cached read model derived from the adjustment ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub barcode: String,
    /// Brand name.
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

impl Product {
    /// The stored subcategory snapshot, if one was recorded.
    pub fn subcategory_snapshot(&self) -> Option<SubcategorySnapshot> {
        self.subcategory_name
            .as_ref()
            .map(|name| SubcategorySnapshot::new(name.clone(), self.supplier_name.clone()))
    }
}

/// An in-flight product record produced by identity resolution.
///
/// For a known barcode the draft mirrors the stored product (snapshot
/// fields included). For an unknown barcode only `barcode` is set and
/// `id` is `None`, signaling a to-be-created product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    pub id: Option<Uuid>,
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
}

impl ProductDraft {
    /// A blank draft for a barcode with no stored product.
    pub fn for_barcode(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            ..Self::default()
        }
    }
}

impl From<Product> for ProductDraft {
    fn from(p: Product) -> Self {
        Self {
            id: Some(p.id),
            barcode: p.barcode,
            name: p.name,
            model: p.model,
            category_id: p.category_id,
            subcategory_name: p.subcategory_name,
            supplier_name: p.supplier_name,
            size: p.size,
            flavor: p.flavor,
            nicotine_mg: p.nicotine_mg,
            sell_price: p.sell_price,
            quantity: p.quantity,
        }
    }
}

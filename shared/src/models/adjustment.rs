//! Quantity ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason recorded on ledger rows appended by a stock count.
pub const REASON_STOCK_COUNT: &str = "stock_count";

/// One append-only quantity-change event.
///
/// A product's displayed quantity is the sum of its adjustments; the row
/// is never updated or deleted after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub qty_added: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Sum a sequence of ledger deltas into the derived quantity.
pub fn ledger_sum<'a, I>(adjustments: I) -> i64
where
    I: IntoIterator<Item = &'a InventoryAdjustment>,
{
    adjustments.into_iter().map(|a| i64::from(a.qty_added)).sum()
}

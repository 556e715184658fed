//! Tab (pay-later) model.

use crate::checkout::cart::totals_for;
use crate::models::LineItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tab lifecycle. `Open` is the only state with outgoing transitions; `Paid`
/// and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Open,
    Paid,
    Cancelled,
}

impl TabStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabStatus::Open => "open",
            TabStatus::Paid => "paid",
            TabStatus::Cancelled => "cancelled",
        }
    }
}

/// A named, not-yet-settled pending order. Items are a snapshot of the cart
/// the tab was created from; totals are fixed at creation time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: TabStatus,
}

impl Tab {
    /// Build an open tab from a cart snapshot.
    pub fn new(customer_name: String, items: Vec<LineItem>, tax_rate: Decimal) -> Self {
        let totals = totals_for(&items, tax_rate);
        Tab {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            customer_name,
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            status: TabStatus::Open,
        }
    }
}

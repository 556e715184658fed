//! Line item model shared by carts, tabs and persisted orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sellable line: a product reference with the unit price in effect and a
/// quantity. Aggregates never share a line by reference; lines are cloned when
/// they move from a cart into a tab or an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl LineItem {
    /// Extended price for this line.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

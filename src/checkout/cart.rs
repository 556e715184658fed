//! Cart state and money arithmetic.

use crate::models::LineItem;
use rust_decimal::Decimal;
use serde::Serialize;

/// Transient per-register cart. Lines are unique by product id; re-adding a
/// product increments its quantity instead of duplicating the line.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<LineItem>,
}

/// Subtotal/tax/total triple derived from a line list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Compute totals for a line list under the given tax rate, rounded to 2
/// decimal places.
pub fn totals_for(lines: &[LineItem], tax_rate: Decimal) -> CartTotals {
    let subtotal: Decimal = lines.iter().map(LineItem::line_total).sum();
    let subtotal = subtotal.round_dp(2);
    let tax = (subtotal * tax_rate).round_dp(2);
    CartTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Owned copy of the lines, for handing to a tab or an order.
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.lines.clone()
    }

    /// Add a line, merging with an existing line for the same product.
    pub fn add(&mut self, line: LineItem) {
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
    }

    /// Bump the quantity of an existing line. Unknown product ids are ignored.
    pub fn increment(&mut self, product_id: &str) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += 1;
        }
    }

    /// Drop the quantity of an existing line, removing the line at zero.
    pub fn decrement(&mut self, product_id: &str) {
        if let Some(pos) = self.lines.iter().position(|l| l.product_id == product_id) {
            if self.lines[pos].quantity > 1 {
                self.lines[pos].quantity -= 1;
            } else {
                self.lines.remove(pos);
            }
        }
    }

    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn totals(&self, tax_rate: Decimal) -> CartTotals {
        totals_for(&self.lines, tax_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(product_id: &str, unit_price: &str, quantity: i32) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            name: format!("Product {}", product_id),
            unit_price: Decimal::from_str(unit_price).unwrap(),
            quantity,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add(line("p1", "2.50", 1));
        cart.add(line("p1", "2.50", 1));
        cart.add(line("p2", "1.00", 3));

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[1].quantity, 3);
    }

    #[test]
    fn test_increment_bumps_quantity() {
        let mut cart = Cart::new();
        cart.add(line("p1", "2.50", 1));
        cart.increment("p1");
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_increment_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add(line("p1", "2.50", 1));
        cart.increment("nope");
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(line("p1", "2.50", 2));
        cart.decrement("p1");
        assert_eq!(cart.lines()[0].quantity, 1);
        cart.decrement("p1");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_drops_whole_line() {
        let mut cart = Cart::new();
        cart.add(line("p1", "2.50", 5));
        cart.add(line("p2", "1.00", 1));
        cart.remove("p1");
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, "p2");
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add(line("p1", "2.50", 5));
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_are_sum_of_line_totals() {
        let lines = vec![line("p1", "2.50", 2), line("p2", "1.75", 3)];
        let totals = totals_for(&lines, Decimal::ZERO);
        assert_eq!(totals.subtotal, dec("10.25"));
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, dec("10.25"));
    }

    #[test]
    fn test_totals_apply_tax_rate_with_rounding() {
        // 10.25 * 0.18 = 1.845, rounds to 1.84 (midpoint to even at 2 dp)
        let lines = vec![line("p1", "2.50", 2), line("p2", "1.75", 3)];
        let totals = totals_for(&lines, dec("0.18"));
        assert_eq!(totals.subtotal, dec("10.25"));
        assert_eq!(totals.tax, dec("1.84"));
        assert_eq!(totals.total, dec("12.09"));
    }

    #[test]
    fn test_totals_for_empty_cart_are_zero() {
        let totals = totals_for(&[], dec("0.18"));
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }
}

//! Domain models for pos-service.

mod line_item;
mod product;

pub use line_item::LineItem;
pub use product::Product;

//! Front-of-house checkout state: carts, tabs, and the desk task that owns them.

mod cart;
mod desk;
mod tab;

pub use cart::{totals_for, Cart, CartTotals};
pub use desk::{CartView, CheckoutDesk, DeskError};
pub use tab::{Tab, TabStatus};

//! Checkout desk: single-owner store for register carts and the tab book.
//!
//! All mutable front-of-house state lives inside one tokio task. Handlers talk
//! to it through [`CheckoutDesk`], which sends command messages over an mpsc
//! channel and awaits a oneshot reply, so every mutation is serialized without
//! locks. Settlement is a begin/finish/abort protocol: the desk hands out a
//! snapshot and marks the cart or tab as in flight, the caller runs the order
//! transaction against the database, then reports back. The desk itself never
//! awaits the database.

use crate::checkout::cart::{Cart, CartTotals};
use crate::checkout::tab::{Tab, TabStatus};
use crate::error::AppError;
use crate::models::LineItem;
use crate::services::metrics::{TABS_CLOSED_TOTAL, TABS_OPENED_TOTAL};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Errors surfaced by desk operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeskError {
    #[error("Register not found")]
    RegisterNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Name required for tab")]
    MissingName,

    #[error("Tab not found")]
    TabNotFound,

    #[error("Tab is not open")]
    TabNotOpen,

    #[error("Tab is empty")]
    EmptyTab,

    #[error("Payment already in progress")]
    SettlementInProgress,

    #[error("Checkout desk is not running")]
    Closed,
}

impl From<DeskError> for AppError {
    fn from(err: DeskError) -> Self {
        match err {
            DeskError::EmptyCart | DeskError::MissingName => {
                AppError::BadRequest(anyhow::Error::new(err))
            }
            DeskError::RegisterNotFound | DeskError::TabNotFound => {
                AppError::NotFound(anyhow::Error::new(err))
            }
            DeskError::TabNotOpen | DeskError::EmptyTab | DeskError::SettlementInProgress => {
                AppError::Conflict(anyhow::Error::new(err))
            }
            DeskError::Closed => AppError::InternalError(anyhow::Error::new(err)),
        }
    }
}

/// Cart contents plus display totals under the configured tax rate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartView {
    fn new(items: Vec<LineItem>, totals: CartTotals) -> Self {
        CartView {
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, DeskError>>;

enum DeskCommand {
    OpenRegister {
        reply: oneshot::Sender<Uuid>,
    },
    CloseRegister {
        register: Uuid,
        reply: Reply<()>,
    },
    ViewCart {
        register: Uuid,
        reply: Reply<CartView>,
    },
    AddItem {
        register: Uuid,
        line: LineItem,
        reply: Reply<CartView>,
    },
    IncrementItem {
        register: Uuid,
        product_id: String,
        reply: Reply<CartView>,
    },
    DecrementItem {
        register: Uuid,
        product_id: String,
        reply: Reply<CartView>,
    },
    RemoveItem {
        register: Uuid,
        product_id: String,
        reply: Reply<CartView>,
    },
    ClearCart {
        register: Uuid,
        reply: Reply<CartView>,
    },
    SaveTab {
        register: Uuid,
        customer_name: String,
        reply: Reply<Tab>,
    },
    ListTabs {
        include_closed: bool,
        reply: oneshot::Sender<Vec<Tab>>,
    },
    BeginCartSettlement {
        register: Uuid,
        reply: Reply<CartView>,
    },
    FinishCartSettlement {
        register: Uuid,
        reply: Reply<()>,
    },
    AbortCartSettlement {
        register: Uuid,
        reply: Reply<()>,
    },
    BeginTabSettlement {
        tab: Uuid,
        reply: Reply<Tab>,
    },
    FinishTabSettlement {
        tab: Uuid,
        reply: Reply<Tab>,
    },
    AbortTabSettlement {
        tab: Uuid,
        reply: Reply<()>,
    },
    CancelTab {
        tab: Uuid,
        reply: Reply<Tab>,
    },
}

struct Register {
    cart: Cart,
    paying: bool,
}

struct DeskState {
    tax_rate: Decimal,
    registers: HashMap<Uuid, Register>,
    // Vec keeps tabs in creation order for the open-tabs view.
    tabs: Vec<Tab>,
    settling: HashSet<Uuid>,
}

impl DeskState {
    fn new(tax_rate: Decimal) -> Self {
        DeskState {
            tax_rate,
            registers: HashMap::new(),
            tabs: Vec::new(),
            settling: HashSet::new(),
        }
    }

    fn cart_view(&self, register: &Register) -> CartView {
        CartView::new(register.cart.snapshot(), register.cart.totals(self.tax_rate))
    }

    fn register_mut(&mut self, register: Uuid) -> Result<&mut Register, DeskError> {
        self.registers
            .get_mut(&register)
            .ok_or(DeskError::RegisterNotFound)
    }

    fn tab_mut(&mut self, tab: Uuid) -> Result<&mut Tab, DeskError> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == tab)
            .ok_or(DeskError::TabNotFound)
    }

    /// Mutate a register's cart, refusing while a payment is in flight.
    fn with_cart(
        &mut self,
        register: Uuid,
        apply: impl FnOnce(&mut Cart),
    ) -> Result<CartView, DeskError> {
        let tax_rate = self.tax_rate;
        let reg = self.register_mut(register)?;
        if reg.paying {
            return Err(DeskError::SettlementInProgress);
        }
        apply(&mut reg.cart);
        Ok(CartView::new(reg.cart.snapshot(), reg.cart.totals(tax_rate)))
    }

    fn open_register(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        self.registers.insert(
            id,
            Register {
                cart: Cart::new(),
                paying: false,
            },
        );
        tracing::debug!(register_id = %id, "register opened");
        id
    }

    fn close_register(&mut self, register: Uuid) -> Result<(), DeskError> {
        self.registers
            .remove(&register)
            .map(|_| tracing::debug!(register_id = %register, "register closed"))
            .ok_or(DeskError::RegisterNotFound)
    }

    fn view_cart(&self, register: Uuid) -> Result<CartView, DeskError> {
        let reg = self
            .registers
            .get(&register)
            .ok_or(DeskError::RegisterNotFound)?;
        Ok(self.cart_view(reg))
    }

    fn save_tab(&mut self, register: Uuid, customer_name: String) -> Result<Tab, DeskError> {
        let tax_rate = self.tax_rate;
        let reg = self.register_mut(register)?;
        if reg.paying {
            return Err(DeskError::SettlementInProgress);
        }
        if reg.cart.is_empty() {
            return Err(DeskError::EmptyCart);
        }
        let name = customer_name.trim();
        if name.is_empty() {
            return Err(DeskError::MissingName);
        }

        // Snapshot plus clear happen inside this one command, so no other
        // caller can observe the cart between the two.
        let tab = Tab::new(name.to_string(), reg.cart.snapshot(), tax_rate);
        reg.cart.clear();

        tracing::info!(tab_id = %tab.id, customer = %tab.customer_name, total = %tab.total, "tab opened");
        TABS_OPENED_TOTAL.inc();
        self.tabs.push(tab.clone());
        Ok(tab)
    }

    fn list_tabs(&self, include_closed: bool) -> Vec<Tab> {
        self.tabs
            .iter()
            .filter(|t| include_closed || t.status == TabStatus::Open)
            .cloned()
            .collect()
    }

    fn begin_cart_settlement(&mut self, register: Uuid) -> Result<CartView, DeskError> {
        let tax_rate = self.tax_rate;
        let reg = self.register_mut(register)?;
        if reg.paying {
            return Err(DeskError::SettlementInProgress);
        }
        if reg.cart.is_empty() {
            return Err(DeskError::EmptyCart);
        }
        reg.paying = true;
        Ok(CartView::new(reg.cart.snapshot(), reg.cart.totals(tax_rate)))
    }

    fn finish_cart_settlement(&mut self, register: Uuid) -> Result<(), DeskError> {
        let reg = self.register_mut(register)?;
        reg.paying = false;
        reg.cart.clear();
        Ok(())
    }

    fn abort_cart_settlement(&mut self, register: Uuid) -> Result<(), DeskError> {
        let reg = self.register_mut(register)?;
        reg.paying = false;
        Ok(())
    }

    fn begin_tab_settlement(&mut self, tab: Uuid) -> Result<Tab, DeskError> {
        let already_settling = self.settling.contains(&tab);
        let tab_ref = self.tab_mut(tab)?;
        if tab_ref.status != TabStatus::Open {
            return Err(DeskError::TabNotOpen);
        }
        if already_settling {
            return Err(DeskError::SettlementInProgress);
        }
        if tab_ref.items.is_empty() {
            return Err(DeskError::EmptyTab);
        }
        let snapshot = tab_ref.clone();
        self.settling.insert(tab);
        Ok(snapshot)
    }

    fn finish_tab_settlement(&mut self, tab: Uuid) -> Result<Tab, DeskError> {
        self.settling.remove(&tab);
        let tab_ref = self.tab_mut(tab)?;
        tab_ref.status = TabStatus::Paid;
        tracing::info!(tab_id = %tab, "tab settled");
        TABS_CLOSED_TOTAL.with_label_values(&["paid"]).inc();
        Ok(tab_ref.clone())
    }

    fn abort_tab_settlement(&mut self, tab: Uuid) -> Result<(), DeskError> {
        self.settling.remove(&tab);
        // The tab stays open; a failed order transaction must not move it.
        Ok(())
    }

    fn cancel_tab(&mut self, tab: Uuid) -> Result<Tab, DeskError> {
        if self.settling.contains(&tab) {
            return Err(DeskError::SettlementInProgress);
        }
        let tab_ref = self.tab_mut(tab)?;
        if tab_ref.status != TabStatus::Open {
            return Err(DeskError::TabNotOpen);
        }
        tab_ref.status = TabStatus::Cancelled;
        tracing::info!(tab_id = %tab, "tab cancelled");
        TABS_CLOSED_TOTAL.with_label_values(&["cancelled"]).inc();
        Ok(tab_ref.clone())
    }

    fn handle(&mut self, command: DeskCommand) {
        match command {
            DeskCommand::OpenRegister { reply } => {
                let _ = reply.send(self.open_register());
            }
            DeskCommand::CloseRegister { register, reply } => {
                let _ = reply.send(self.close_register(register));
            }
            DeskCommand::ViewCart { register, reply } => {
                let _ = reply.send(self.view_cart(register));
            }
            DeskCommand::AddItem {
                register,
                line,
                reply,
            } => {
                let _ = reply.send(self.with_cart(register, |cart| cart.add(line)));
            }
            DeskCommand::IncrementItem {
                register,
                product_id,
                reply,
            } => {
                let _ = reply.send(self.with_cart(register, |cart| cart.increment(&product_id)));
            }
            DeskCommand::DecrementItem {
                register,
                product_id,
                reply,
            } => {
                let _ = reply.send(self.with_cart(register, |cart| cart.decrement(&product_id)));
            }
            DeskCommand::RemoveItem {
                register,
                product_id,
                reply,
            } => {
                let _ = reply.send(self.with_cart(register, |cart| cart.remove(&product_id)));
            }
            DeskCommand::ClearCart { register, reply } => {
                let _ = reply.send(self.with_cart(register, Cart::clear));
            }
            DeskCommand::SaveTab {
                register,
                customer_name,
                reply,
            } => {
                let _ = reply.send(self.save_tab(register, customer_name));
            }
            DeskCommand::ListTabs {
                include_closed,
                reply,
            } => {
                let _ = reply.send(self.list_tabs(include_closed));
            }
            DeskCommand::BeginCartSettlement { register, reply } => {
                let _ = reply.send(self.begin_cart_settlement(register));
            }
            DeskCommand::FinishCartSettlement { register, reply } => {
                let _ = reply.send(self.finish_cart_settlement(register));
            }
            DeskCommand::AbortCartSettlement { register, reply } => {
                let _ = reply.send(self.abort_cart_settlement(register));
            }
            DeskCommand::BeginTabSettlement { tab, reply } => {
                let _ = reply.send(self.begin_tab_settlement(tab));
            }
            DeskCommand::FinishTabSettlement { tab, reply } => {
                let _ = reply.send(self.finish_tab_settlement(tab));
            }
            DeskCommand::AbortTabSettlement { tab, reply } => {
                let _ = reply.send(self.abort_tab_settlement(tab));
            }
            DeskCommand::CancelTab { tab, reply } => {
                let _ = reply.send(self.cancel_tab(tab));
            }
        }
    }
}

async fn run_desk(mut rx: mpsc::Receiver<DeskCommand>, mut state: DeskState) {
    while let Some(command) = rx.recv().await {
        state.handle(command);
    }
    tracing::debug!("checkout desk stopped");
}

/// Cloneable handle to the desk task.
#[derive(Clone)]
pub struct CheckoutDesk {
    tx: mpsc::Sender<DeskCommand>,
}

impl CheckoutDesk {
    /// Spawn the desk task with an empty floor.
    pub fn spawn(tax_rate: Decimal) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(run_desk(rx, DeskState::new(tax_rate)));
        CheckoutDesk { tx }
    }

    async fn ask<T>(
        &self,
        command: DeskCommand,
        rx: oneshot::Receiver<Result<T, DeskError>>,
    ) -> Result<T, DeskError> {
        self.tx.send(command).await.map_err(|_| DeskError::Closed)?;
        rx.await.map_err(|_| DeskError::Closed)?
    }

    pub async fn open_register(&self) -> Result<Uuid, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DeskCommand::OpenRegister { reply })
            .await
            .map_err(|_| DeskError::Closed)?;
        rx.await.map_err(|_| DeskError::Closed)
    }

    pub async fn close_register(&self, register: Uuid) -> Result<(), DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::CloseRegister { register, reply }, rx)
            .await
    }

    pub async fn cart(&self, register: Uuid) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::ViewCart { register, reply }, rx).await
    }

    pub async fn add_item(&self, register: Uuid, line: LineItem) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(
            DeskCommand::AddItem {
                register,
                line,
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn increment_item(
        &self,
        register: Uuid,
        product_id: &str,
    ) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(
            DeskCommand::IncrementItem {
                register,
                product_id: product_id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn decrement_item(
        &self,
        register: Uuid,
        product_id: &str,
    ) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(
            DeskCommand::DecrementItem {
                register,
                product_id: product_id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn remove_item(
        &self,
        register: Uuid,
        product_id: &str,
    ) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(
            DeskCommand::RemoveItem {
                register,
                product_id: product_id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn clear_cart(&self, register: Uuid) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::ClearCart { register, reply }, rx)
            .await
    }

    pub async fn save_tab(&self, register: Uuid, customer_name: &str) -> Result<Tab, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(
            DeskCommand::SaveTab {
                register,
                customer_name: customer_name.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn tabs(&self, include_closed: bool) -> Result<Vec<Tab>, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DeskCommand::ListTabs {
                include_closed,
                reply,
            })
            .await
            .map_err(|_| DeskError::Closed)?;
        rx.await.map_err(|_| DeskError::Closed)
    }

    pub async fn begin_cart_settlement(&self, register: Uuid) -> Result<CartView, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::BeginCartSettlement { register, reply }, rx)
            .await
    }

    pub async fn finish_cart_settlement(&self, register: Uuid) -> Result<(), DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::FinishCartSettlement { register, reply }, rx)
            .await
    }

    pub async fn abort_cart_settlement(&self, register: Uuid) -> Result<(), DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::AbortCartSettlement { register, reply }, rx)
            .await
    }

    pub async fn begin_tab_settlement(&self, tab: Uuid) -> Result<Tab, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::BeginTabSettlement { tab, reply }, rx)
            .await
    }

    pub async fn finish_tab_settlement(&self, tab: Uuid) -> Result<Tab, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::FinishTabSettlement { tab, reply }, rx)
            .await
    }

    pub async fn abort_tab_settlement(&self, tab: Uuid) -> Result<(), DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::AbortTabSettlement { tab, reply }, rx)
            .await
    }

    pub async fn cancel_tab(&self, tab: Uuid) -> Result<Tab, DeskError> {
        let (reply, rx) = oneshot::channel();
        self.ask(DeskCommand::CancelTab { tab, reply }, rx).await
    }
}

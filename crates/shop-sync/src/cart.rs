//! # Cart State
//!
//! The customer's basket while a shop is open.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action                Method                 Cart Change            │
//! │  ─────────                ──────                 ───────────            │
//! │                                                                         │
//! │  Click "Add" ───────────► add(item) ───────────► +1 or push qty 1      │
//! │                                                  (never above stock)    │
//! │                                                                         │
//! │  Click +/- ─────────────► adjust(id, ±1) ──────► clamp to [1, stock]   │
//! │                                                                         │
//! │  Click Remove ──────────► remove(id) ──────────► line dropped          │
//! │                                                                         │
//! │  Pay cash / bank ───────► checkout(method) ────► purchase request,     │
//! │                                                  cart cleared           │
//! │                                                                         │
//! │  Session teardown ──────► clear() ─────────────► empty                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use shop_core::pricing;
use shop_core::{CoreError, CoreResult, InventoryItem, ItemId, Money};
use ts_rs::TS;

use crate::protocol::OutboundRequest;

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl std::str::FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank" | "card" => Ok(PaymentMethod::Bank),
            other => Err(shop_core::ValidationError::NotAllowed {
                field: format!("payment method '{}'", other),
                allowed: vec!["cash".into(), "bank".into()],
            }
            .into()),
        }
    }
}

/// An item in the cart.
///
/// `price` is the effective price at the moment the item was added; later
/// discount changes do not touch lines already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub id: ItemId,
    pub item: String,
    pub label: String,
    pub price: Money,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by item id
/// - `1 ≤ quantity ≤ stock` as of the last add/adjust
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of `item`, priced under `shop_discount`.
    pub fn add(&mut self, item: &InventoryItem, shop_discount: i64) -> CoreResult<()> {
        let id = item.id.ok_or(CoreError::ItemNotFound(0))?;

        if let Some(line) = self.lines.iter_mut().find(|line| line.id == id) {
            if line.quantity >= item.quantity {
                return Err(CoreError::InsufficientStock {
                    item: item.item.clone(),
                    available: item.quantity,
                    requested: line.quantity + 1,
                });
            }
            line.quantity += 1;
            return Ok(());
        }

        if item.quantity <= 0 {
            return Err(CoreError::InsufficientStock {
                item: item.item.clone(),
                available: item.quantity,
                requested: 1,
            });
        }

        self.lines.push(CartLine {
            id,
            item: item.item.clone(),
            label: item.label.clone(),
            price: pricing::compute(item, shop_discount).final_price,
            quantity: 1,
        });
        Ok(())
    }

    /// Changes a line's quantity by `delta`, clamped to `[1, stock]`.
    pub fn adjust(&mut self, id: ItemId, delta: i64, stock: i64) -> CoreResult<i64> {
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(CoreError::ItemNotFound(id))?;
        line.quantity = line.quantity.saturating_add(delta).max(1).min(stock);
        Ok(line.quantity)
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Turns the cart into a purchase request and empties it.
    pub fn checkout(&mut self, pay_with: PaymentMethod) -> CoreResult<OutboundRequest> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        let cart = std::mem::take(&mut self.lines);
        Ok(OutboundRequest::Purchase { cart, pay_with })
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

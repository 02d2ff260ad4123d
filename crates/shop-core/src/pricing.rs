//! # Pricing Engine
//!
//! Effective sale price of an inventory item.
//!
//! ## Discount Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list price = overridePrice if set, else basePrice, else 0             │
//! │                                                                         │
//! │  item.discount > 0 ?  ──yes──►  use item.discount                      │
//! │        │ no                                                             │
//! │        ▼                                                                │
//! │  shop discount > 0 ?  ──yes──►  use shop discount                      │
//! │        │ no                                                             │
//! │        ▼                                                                │
//! │  no discount                                                            │
//! │                                                                         │
//! │  Discounts never stack. final = floor(list × (100 − d) / 100)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `compute` is pure and cheap; callers recompute it on every render rather
//! than caching quotes across inventory or discount changes.

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::InventoryItem;

/// Result of pricing one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceQuote {
    /// Price before discount, never negative.
    pub base_price: Money,
    /// Price after discount, `0 ≤ final_price ≤ base_price`.
    pub final_price: Money,
    /// The discount actually applied, `0..=100`.
    pub discount_percent: i64,
}

impl PriceQuote {
    /// True when a discount lowered the price.
    pub fn is_discounted(&self) -> bool {
        self.discount_percent > 0 && self.final_price < self.base_price
    }

    /// Total for a quantity at the final price.
    pub fn line_total(&self, quantity: i64) -> Money {
        self.final_price.multiply_quantity(quantity)
    }
}

/// Picks the effective discount: item wins over shop, never additive.
pub fn effective_discount(item_discount: i64, shop_discount: i64) -> i64 {
    let chosen = if item_discount > 0 {
        item_discount
    } else if shop_discount > 0 {
        shop_discount
    } else {
        0
    };
    chosen.min(100)
}

/// Computes the effective sale price of `item` under `shop_discount_percent`.
///
/// ## Example
/// ```rust
/// use shop_core::pricing::compute;
/// use shop_core::types::InventoryItem;
/// use shop_core::Money;
///
/// let mut item = InventoryItem::blank();
/// item.override_price = None;
/// item.base_price = Money::from_units(100);
///
/// assert_eq!(compute(&item, 25).final_price.units(), 75);
///
/// item.discount = 10;
/// assert_eq!(compute(&item, 25).final_price.units(), 90);
/// ```
pub fn compute(item: &InventoryItem, shop_discount_percent: i64) -> PriceQuote {
    let base_price = item.list_price().non_negative();
    let discount_percent = effective_discount(item.discount, shop_discount_percent);
    let final_price = base_price.apply_discount_percent(discount_percent);
    PriceQuote {
        base_price,
        final_price,
        discount_percent,
    }
}

/// True when the shop-wide default applies to this item (no own discount).
///
/// The inventory panel shows the shop default as a hint next to such items.
pub fn uses_shop_default(item: &InventoryItem, shop_discount_percent: i64) -> bool {
    item.discount <= 0 && shop_discount_percent > 0
}

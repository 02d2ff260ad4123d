//! # shop-core: Pure Shop Logic
//!
//! Domain types and the derived views the shop UI reads: effective prices,
//! delivery capacity, vehicle eligibility and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shop Client Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Host UI (rendering, input)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ events / reads                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  shop-sync (session engine)                     │   │
//! │  │   ShopSession ─ merge ─ DraftReconciler ─ ShopGateway           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shop-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ capacity  │  │ validation│  │   │
//! │  │   │ Snapshot  │  │ PriceQuote│  │  Planner  │  │ canonical │  │   │
//! │  │   │  Vehicle  │  │           │  │  Manifest │  │   ids     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO ASYNC • PURE FUNCTIONS                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Snapshot, inventory, deliveries, employees, statistics
//! - [`vehicle`] - Vehicle entry union and canonical record
//! - [`money`] - Whole-unit `Money`
//! - [`coerce`] - Lenient number parsing and field coalescing
//! - [`pricing`] - Effective sale price
//! - [`capacity`] - Manifest capacity and vehicle eligibility
//! - [`validation`] - Identifier canonicalization and input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shop_core::capacity::CapacityPlanner;
//! use shop_core::types::ShopSnapshot;
//!
//! let shop: ShopSnapshot = serde_json::from_value(serde_json::json!({
//!     "identifier": "corner",
//!     "level": 3,
//!     "deliveryCapacityBonus": 10,
//!     "deliveryVehicles": { "speedo": { "capacity": 50 } }
//! })).unwrap();
//!
//! assert_eq!(CapacityPlanner::new(&shop).capacity_for("speedo"), 70);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capacity;
pub mod coerce;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod vehicle;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use capacity::{CapacityCheck, CapacityPlanner, ManifestDraft, ManifestRow, VehicleStatus};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::PriceQuote;
pub use types::*;
pub use vehicle::{VehicleEntry, VehicleRecord, VehicleTemplates};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Level a shop starts at, and the floor for every level field.
pub const DEFAULT_SHOP_LEVEL: u32 = 1;

/// Hard ceiling for any discount percent.
pub const MAX_DISCOUNT_PERCENT: i64 = 100;

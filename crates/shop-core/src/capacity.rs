//! # Capacity Planner
//!
//! Delivery manifests against vehicle capacity and eligibility.
//!
//! ## Two Independent Gates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ownership.unlocked                               │
//! │                     true               false                            │
//! │              ┌───────────────────┬───────────────────┐                  │
//! │  level  ok   │ Unlocked          │ Purchasable       │                  │
//! │  met         │ assignable        │ unlock allowed    │                  │
//! │              ├───────────────────┼───────────────────┤                  │
//! │  level  too  │ Unlocked          │ LevelGated        │                  │
//! │  low         │ assignable        │ unlock refused    │                  │
//! │              └───────────────────┴───────────────────┘                  │
//! │                                                                         │
//! │  Manifest assignment only looks at ownership. Level is checked for     │
//! │  unlocking and shown for display, never for assignment.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capacity
//! `base + max(0, level − 1) × bonus` when a per-level bonus is configured,
//! else `base`. A capacity of 0 means unconstrained.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ItemId, ManifestLine, ShopSnapshot};
use crate::vehicle::VehicleRecord;

// =============================================================================
// Derived Views
// =============================================================================

/// Result of checking a manifest total against a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CapacityCheck {
    pub total: i64,
    pub capacity: i64,
    pub over_capacity: bool,
}

impl CapacityCheck {
    /// Hint text, `"12 / 70"` or just `"12"` when unconstrained.
    pub fn hint(&self) -> String {
        if self.capacity > 0 {
            format!("{} / {}", self.total, self.capacity)
        } else {
            self.total.to_string()
        }
    }
}

/// What the vehicles panel shows for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleStatus {
    /// Owned; may carry deliveries.
    Unlocked { purchased_at: Option<DateTime<Utc>> },
    /// Not owned and the shop level is too low to buy it.
    LevelGated { required: u32 },
    /// Not owned, level is sufficient; may be unlocked for `price`.
    Purchasable { price: Money },
}

// =============================================================================
// Manifest Draft
// =============================================================================

/// One row of the delivery form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestRow {
    pub item_id: Option<ItemId>,
    pub quantity: i64,
}

/// The delivery form before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDraft {
    pub label: String,
    pub vehicle: Option<String>,
    pub rows: Vec<ManifestRow>,
}

/// A manifest that passed every local check and may be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOrder {
    pub vehicle: String,
    pub label: String,
    pub items: Vec<ManifestLine>,
}

impl ManifestDraft {
    /// Adds an empty row with the configured default quantity.
    pub fn push_row(&mut self, default_quantity: i64) {
        self.rows.push(ManifestRow {
            item_id: None,
            quantity: default_quantity,
        });
    }

    /// Lines that name a known item with a positive quantity.
    pub fn resolve(&self, shop: &ShopSnapshot) -> Vec<ManifestLine> {
        self.rows
            .iter()
            .filter(|row| row.quantity > 0)
            .filter_map(|row| {
                let item = shop.item_by_id(row.item_id?)?;
                Some(ManifestLine {
                    item: item.item.clone(),
                    label: item.label.clone(),
                    quantity: row.quantity,
                })
            })
            .collect()
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Read-only capacity and eligibility view over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CapacityPlanner<'a> {
    shop: &'a ShopSnapshot,
}

impl<'a> CapacityPlanner<'a> {
    pub fn new(shop: &'a ShopSnapshot) -> Self {
        CapacityPlanner { shop }
    }

    /// Capacity of `vehicle_key` at the shop's current level.
    ///
    /// Unknown vehicles have a base capacity of 0.
    pub fn capacity_for(&self, vehicle_key: &str) -> i64 {
        let base = self.shop.vehicle(vehicle_key).map_or(0, |v| v.capacity);
        let per_level = self.shop.delivery_capacity_bonus;
        if per_level > 0 {
            let levels_above_first = i64::from(self.shop.level.saturating_sub(1));
            base + levels_above_first * per_level
        } else {
            base
        }
    }

    /// Checks a set of quantities against a vehicle.
    ///
    /// Negative quantities count as zero.
    pub fn validate<I>(&self, quantities: I, vehicle_key: &str) -> CapacityCheck
    where
        I: IntoIterator<Item = i64>,
    {
        let total = quantities.into_iter().map(|q| q.max(0)).sum();
        let capacity = self.capacity_for(vehicle_key);
        CapacityCheck {
            total,
            capacity,
            over_capacity: capacity > 0 && total > capacity,
        }
    }

    /// Checks manifest lines against a vehicle.
    pub fn validate_lines(&self, lines: &[ManifestLine], vehicle_key: &str) -> CapacityCheck {
        self.validate(lines.iter().map(|line| line.quantity), vehicle_key)
    }

    /// Ownership gate.
    pub fn is_unlocked(&self, vehicle_key: &str) -> bool {
        self.shop
            .ownership(vehicle_key)
            .map_or(false, |ownership| ownership.unlocked)
    }

    /// Level gate.
    pub fn meets_level(&self, vehicle: &VehicleRecord) -> bool {
        self.shop.level >= vehicle.min_level.max(1)
    }

    /// Vehicles that may be assigned to a manifest.
    pub fn unlocked_vehicles(&self) -> Vec<&'a VehicleRecord> {
        self.shop
            .delivery_vehicles
            .iter()
            .filter(|(key, _)| self.is_unlocked(key))
            .map(|(_, vehicle)| vehicle)
            .collect()
    }

    /// Display status; ownership is reported before the level gate.
    pub fn vehicle_status(&self, vehicle_key: &str) -> CoreResult<VehicleStatus> {
        let vehicle = self
            .shop
            .vehicle(vehicle_key)
            .ok_or_else(|| CoreError::VehicleNotFound(vehicle_key.to_string()))?;
        if self.is_unlocked(vehicle_key) {
            let purchased_at = self.shop.ownership(vehicle_key).and_then(|o| o.purchased_at);
            return Ok(VehicleStatus::Unlocked { purchased_at });
        }
        if !self.meets_level(vehicle) {
            return Ok(VehicleStatus::LevelGated {
                required: vehicle.min_level,
            });
        }
        Ok(VehicleStatus::Purchasable {
            price: vehicle.price,
        })
    }

    /// Checks that `vehicle_key` may be unlocked now.
    pub fn check_unlock(&self, vehicle_key: &str) -> CoreResult<()> {
        match self.vehicle_status(vehicle_key)? {
            VehicleStatus::Purchasable { .. } => Ok(()),
            VehicleStatus::Unlocked { .. } => {
                Err(CoreError::VehicleAlreadyUnlocked(vehicle_key.to_string()))
            }
            VehicleStatus::LevelGated { required } => Err(CoreError::LevelTooLow {
                required,
                current: self.shop.level,
            }),
        }
    }

    /// Validates a delivery form for submission.
    ///
    /// ## Rejections (no request is produced)
    /// - no vehicle chosen
    /// - vehicle unknown or not unlocked
    /// - no usable manifest line
    /// - total over capacity
    pub fn check_submission(&self, draft: &ManifestDraft) -> CoreResult<DeliveryOrder> {
        let vehicle_key = draft
            .vehicle
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(CoreError::NoVehicleSelected)?;
        if self.shop.vehicle(vehicle_key).is_none() {
            return Err(CoreError::VehicleNotFound(vehicle_key.to_string()));
        }
        if !self.is_unlocked(vehicle_key) {
            return Err(CoreError::VehicleLocked(vehicle_key.to_string()));
        }

        let items = draft.resolve(self.shop);
        if items.is_empty() {
            return Err(CoreError::EmptyManifest);
        }

        let check = self.validate_lines(&items, vehicle_key);
        if check.over_capacity {
            return Err(CoreError::OverCapacity {
                total: check.total,
                capacity: check.capacity,
            });
        }

        Ok(DeliveryOrder {
            vehicle: vehicle_key.to_string(),
            label: draft.label.trim().to_string(),
            items,
        })
    }

    /// Checks that a delivery may be started, optionally with `vehicle`.
    pub fn check_start(&self, delivery_id: &str, vehicle: Option<&str>) -> CoreResult<()> {
        let delivery = self
            .shop
            .delivery(delivery_id)
            .ok_or_else(|| CoreError::DeliveryNotFound(delivery_id.to_string()))?;
        if !delivery.is_pending() {
            return Err(CoreError::DeliveryNotPending(delivery_id.to_string()));
        }
        match vehicle.filter(|key| !key.is_empty()) {
            Some(key) if self.shop.vehicle(key).is_none() => {
                Err(CoreError::VehicleNotFound(key.to_string()))
            }
            Some(key) if !self.is_unlocked(key) => Err(CoreError::VehicleLocked(key.to_string())),
            _ => Ok(()),
        }
    }
}

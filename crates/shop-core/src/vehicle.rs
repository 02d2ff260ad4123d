//! # Delivery Vehicles
//!
//! Vehicle entries show up in several shapes: a bare template key in a shop's
//! creator block, an inline record in `deliveryVehicles`, or a half-filled
//! row from the admin editor. All of them resolve here, through one function,
//! into a single [`VehicleRecord`].
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VehicleEntry::Reference("speedo")   VehicleEntry::Inline({...})        │
//! │                 │                               │                       │
//! │                 └───────────────┬───────────────┘                       │
//! │                                 ▼                                       │
//! │                      VehicleEntry::resolve()                            │
//! │                                 │                                       │
//! │   each field:  inline fields ──► template[key] fields ──► hard default  │
//! │                                                                         │
//! │   defaults: price 0, minLevel 1, capacity 0, trunk 0, fuelModifier 1    │
//! │   fuelModifier ≤ 0 is replaced by 1                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::coerce::{first_present, first_string, level, number_or};
use crate::money::Money;

/// Vehicle templates keyed by template key, as pushed by the admin overview.
pub type VehicleTemplates = BTreeMap<String, Value>;

const KEY_FIELDS: &[&str] = &[
    "key",
    "vehicle_key",
    "model",
    "vehicle",
    "spawn",
    "spawnName",
    "modelName",
    "label",
    "name",
];
const MODEL_FIELDS: &[&str] = &["model", "spawn", "vehicle", "modelName"];
const LABEL_FIELDS: &[&str] = &["label", "display", "name"];
const TEMPLATE_LABEL_FIELDS: &[&str] = &["label", "name"];
const PRICE_FIELDS: &[&str] = &["price", "cost", "purchasePrice"];
const LEVEL_FIELDS: &[&str] = &["minLevel", "min_level", "level"];
const CAPACITY_FIELDS: &[&str] = &["capacity", "cargo", "maxCapacity"];
const TRUNK_FIELDS: &[&str] = &["trunk", "trunk_size", "trunkInventory"];
const FUEL_FIELDS: &[&str] = &["fuelModifier", "fuel_modifier"];

// =============================================================================
// Canonical Record
// =============================================================================

/// The canonical delivery vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub price: Money,
    #[serde(default = "default_min_level")]
    pub min_level: u32,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub trunk: i64,
    #[serde(default = "default_fuel_modifier")]
    pub fuel_modifier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

fn default_min_level() -> u32 {
    1
}

fn default_fuel_modifier() -> f64 {
    1.0
}

impl VehicleRecord {
    /// A blank row for manual entry in the admin editor.
    pub fn blank() -> Self {
        VehicleRecord {
            key: String::new(),
            model: String::new(),
            label: String::new(),
            price: Money::zero(),
            min_level: 1,
            capacity: 0,
            trunk: 0,
            fuel_modifier: 1.0,
            icon: None,
        }
    }

    /// Re-enters the record as an inline entry.
    pub fn to_entry(&self) -> VehicleEntry {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => VehicleEntry::Inline(map),
            _ => VehicleEntry::Reference(self.key.clone()),
        }
    }

    /// Sets the fuel modifier, replacing non-positive or non-finite input with 1.
    pub fn set_fuel_modifier(&mut self, value: f64) {
        self.fuel_modifier = sanitize_fuel(value);
    }
}

fn sanitize_fuel(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

// =============================================================================
// Entry Union
// =============================================================================

/// A vehicle as it appears in inbound data.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleEntry {
    /// A bare template key.
    Reference(String),
    /// A full or partial inline record.
    Inline(Map<String, Value>),
}

impl VehicleEntry {
    /// Classifies a JSON value. Empty strings and non-object values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(key) if !key.is_empty() => Some(VehicleEntry::Reference(key.clone())),
            Value::Number(n) => Some(VehicleEntry::Reference(n.to_string())),
            Value::Object(map) => Some(VehicleEntry::Inline(map.clone())),
            _ => None,
        }
    }

    /// Resolves the entry against the template table.
    ///
    /// Returns `None` when no key can be derived from the entry.
    pub fn resolve(&self, templates: &VehicleTemplates) -> Option<VehicleRecord> {
        self.resolve_with_key(templates, None)
    }

    /// Resolves the entry, using `fallback_key` when the entry carries none.
    ///
    /// Used for `deliveryVehicles`, where the map key names the vehicle.
    pub fn resolve_with_key(
        &self,
        templates: &VehicleTemplates,
        fallback_key: Option<&str>,
    ) -> Option<VehicleRecord> {
        let empty = Map::new();
        let (inline, key) = match self {
            VehicleEntry::Reference(key) => (&empty, Some(key.clone())),
            VehicleEntry::Inline(map) => (
                map,
                first_string(map, KEY_FIELDS).or_else(|| fallback_key.map(str::to_string)),
            ),
        };
        let key = key.filter(|k| !k.is_empty())?;
        let template = templates
            .get(&key)
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let pick = |inline_keys: &[&str], template_keys: &[&str]| {
            first_present(inline, inline_keys).or_else(|| first_present(template, template_keys))
        };
        let number = |inline_keys: &[&str], template_key: &str, fallback: f64| {
            pick(inline_keys, &[template_key])
                .map(|value| number_or(value, fallback))
                .unwrap_or(fallback)
        };

        let model = first_string(inline, MODEL_FIELDS)
            .or_else(|| first_string(template, &["model"]))
            .unwrap_or_else(|| key.clone());
        let label = first_string(inline, LABEL_FIELDS)
            .or_else(|| first_string(template, TEMPLATE_LABEL_FIELDS))
            .unwrap_or_else(|| model.clone());

        Some(VehicleRecord {
            price: Money::from_number(number(PRICE_FIELDS, "price", 0.0)),
            min_level: level(number(LEVEL_FIELDS, "minLevel", 1.0)),
            capacity: number(CAPACITY_FIELDS, "capacity", 0.0).trunc() as i64,
            trunk: number(TRUNK_FIELDS, "trunk", 0.0).trunc() as i64,
            fuel_modifier: sanitize_fuel(number(FUEL_FIELDS, "fuelModifier", 1.0)),
            icon: first_string(inline, &["icon"]),
            key,
            model,
            label,
        })
    }
}

/// Normalizes a raw vehicle value in one step.
pub fn normalize_vehicle(value: &Value, templates: &VehicleTemplates) -> Option<VehicleRecord> {
    VehicleEntry::from_value(value)?.resolve(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templates() -> VehicleTemplates {
        let mut map = VehicleTemplates::new();
        map.insert(
            "speedo".into(),
            json!({"model": "speedo", "label": "Speedo Van", "price": 15000, "minLevel": 2, "capacity": 50, "trunk": 80}),
        );
        map
    }

    #[test]
    fn test_reference_resolves_from_template() {
        let record = VehicleEntry::Reference("speedo".into())
            .resolve(&templates())
            .unwrap();
        assert_eq!(record.key, "speedo");
        assert_eq!(record.label, "Speedo Van");
        assert_eq!(record.price.units(), 15000);
        assert_eq!(record.min_level, 2);
        assert_eq!(record.capacity, 50);
        assert_eq!(record.trunk, 80);
        assert_eq!(record.fuel_modifier, 1.0);
    }

    #[test]
    fn test_reference_without_template_uses_defaults() {
        let record = VehicleEntry::Reference("boxville".into())
            .resolve(&VehicleTemplates::new())
            .unwrap();
        assert_eq!(record.model, "boxville");
        assert_eq!(record.label, "boxville");
        assert_eq!(record.price, Money::zero());
        assert_eq!(record.min_level, 1);
        assert_eq!(record.capacity, 0);
        assert_eq!(record.fuel_modifier, 1.0);
    }

    #[test]
    fn test_inline_fields_win_over_template() {
        let entry = VehicleEntry::from_value(&json!({
            "vehicle_key": "speedo",
            "cargo": 65,
            "cost": "12000",
            "fuel_modifier": 0
        }))
        .unwrap();
        let record = entry.resolve(&templates()).unwrap();
        assert_eq!(record.key, "speedo");
        assert_eq!(record.capacity, 65);
        assert_eq!(record.price.units(), 12000);
        // template still fills what the inline entry lacks
        assert_eq!(record.trunk, 80);
        assert_eq!(record.fuel_modifier, 1.0);
    }

    #[test]
    fn test_inline_without_key_is_rejected() {
        assert!(normalize_vehicle(&json!({"capacity": 10}), &templates()).is_none());
        assert!(normalize_vehicle(&json!(""), &templates()).is_none());
        assert!(normalize_vehicle(&json!(null), &templates()).is_none());
    }

    #[test]
    fn test_fallback_key_for_map_entries() {
        let entry = VehicleEntry::from_value(&json!({"capacity": 30})).unwrap();
        let record = entry
            .resolve_with_key(&VehicleTemplates::new(), Some("pony"))
            .unwrap();
        assert_eq!(record.key, "pony");
        assert_eq!(record.capacity, 30);
    }

    #[test]
    fn test_normalizing_a_normalized_record_is_stable() {
        let once = normalize_vehicle(
            &json!({"spawn": "mule", "display": "Mule", "maxCapacity": 120, "level": 3, "fuelModifier": 1.4}),
            &templates(),
        )
        .unwrap();
        let twice = once.to_entry().resolve(&templates()).unwrap();
        assert_eq!(once, twice);
        let thrice = twice.to_entry().resolve(&VehicleTemplates::new()).unwrap();
        assert_eq!(twice, thrice);
    }

    #[test]
    fn test_set_fuel_modifier_guards_non_positive() {
        let mut record = VehicleRecord::blank();
        record.set_fuel_modifier(-2.0);
        assert_eq!(record.fuel_modifier, 1.0);
        record.set_fuel_modifier(f64::NAN);
        assert_eq!(record.fuel_modifier, 1.0);
        record.set_fuel_modifier(0.8);
        assert_eq!(record.fuel_modifier, 0.8);
    }
}

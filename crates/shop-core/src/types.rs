//! # Domain Types
//!
//! The shop snapshot and everything hanging off it.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ShopSnapshot                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  inventory      │   │  deliveries     │   │ deliveryVehicles│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  category key → │   │  identifier     │   │  key →          │       │
//! │  │   Category      │   │  vehicle_model  │   │   VehicleRecord │       │
//! │  │   └ items[]     │   │  status         │   │                 │       │
//! │  │  InventoryItem  │   │  items[]        │   │ vehicleOwnership│       │
//! │  └─────────────────┘   └─────────────────┘   │  key → unlocked │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  employees[]    │   │  stats          │   │  creator block  │       │
//! │  │  citizenid,role │   │  labels, sales, │   │  (metadata, raw │       │
//! │  │  wage, status   │   │  xp, deliveries │   │   admin config) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are authoritative and replaced wholesale on every push. Numeric
//! fields are parsed leniently (see [`crate::coerce`]) so a sloppy payload
//! never leaves a field non-numeric. Unknown top-level fields are kept in
//! `extra` and written back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::coerce::{self, de, first_number, first_number_opt, first_string};
use crate::money::Money;
use crate::vehicle::{VehicleEntry, VehicleRecord, VehicleTemplates};

/// Inventory item id, as assigned by the authoritative store.
pub type ItemId = i64;

// =============================================================================
// Inventory
// =============================================================================

/// A stocked item.
///
/// Parsed from loose JSON with the coalescing rule: `basePrice` or
/// `base_price`, `overridePrice` or `override_price`, `minLevel` or
/// `min_level`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Option<ItemId>,
    pub item: String,
    pub label: String,
    pub icon: String,
    pub category: String,
    pub quantity: i64,
    pub base_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_price: Option<Money>,
    pub discount: i64,
    pub min_level: u32,
}

impl InventoryItem {
    /// A blank row for the admin editor.
    pub fn blank() -> Self {
        InventoryItem {
            id: None,
            item: String::new(),
            label: String::new(),
            icon: String::new(),
            category: String::new(),
            quantity: 0,
            base_price: Money::zero(),
            override_price: Some(Money::zero()),
            discount: 0,
            min_level: 1,
        }
    }

    /// Builds an item from a loose JSON object.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let id = first_number_opt(obj, &["id"])
            .filter(|id| *id != 0.0)
            .map(|id| id.trunc() as ItemId);
        InventoryItem {
            id,
            item: first_string(obj, &["item"]).unwrap_or_default(),
            label: first_string(obj, &["label"]).unwrap_or_default(),
            icon: first_string(obj, &["icon"]).unwrap_or_default(),
            category: first_string(obj, &["category"]).unwrap_or_default(),
            quantity: first_number(obj, &["quantity"], 0.0).trunc() as i64,
            base_price: Money::from_number(first_number(obj, &["basePrice", "base_price"], 0.0)),
            override_price: first_number_opt(obj, &["overridePrice", "override_price"])
                .map(Money::from_number),
            discount: first_number(obj, &["discount"], 0.0).trunc() as i64,
            min_level: coerce::level(first_number(obj, &["minLevel", "min_level"], 1.0)),
        }
    }

    /// The price before discounts: the override when set, else the base price.
    pub fn list_price(&self) -> Money {
        self.override_price.unwrap_or(self.base_price)
    }

    /// Display name, falling back to the item code.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.item
        } else {
            &self.label
        }
    }
}

impl<'de> Deserialize<'de> for InventoryItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(InventoryItem::from_object(
            value.as_object().unwrap_or(&Map::new()),
        ))
    }
}

/// One inventory category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub items: Vec<InventoryItem>,
}

// =============================================================================
// Vehicles
// =============================================================================

/// Ownership state of one delivery vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleOwnership {
    #[serde(default, deserialize_with = "de::truthy")]
    pub unlocked: bool,
    #[serde(
        default,
        deserialize_with = "unix_seconds",
        serialize_with = "chrono::serde::ts_seconds_option::serialize"
    )]
    pub purchased_at: Option<DateTime<Utc>>,
}

fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce::finite_number(&value)
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0)))
}

fn vehicle_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, VehicleRecord>, D::Error> {
    let raw: BTreeMap<String, Value> = de::map_or_empty(deserializer)?;
    let templates = VehicleTemplates::new();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let mut record =
                VehicleEntry::from_value(&value)?.resolve_with_key(&templates, Some(&key))?;
            // lookups go through the map key, so the record carries it too
            record.key = key.clone();
            Some((key, record))
        })
        .collect())
}

// =============================================================================
// Deliveries
// =============================================================================

/// One (item, quantity) pair in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLine {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub quantity: i64,
}

/// Delivery lifecycle as reported by the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Free-form delivery metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
}

/// A delivery order (the authoritative form of a manifest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub identifier: String,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub items: Vec<ManifestLine>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub metadata: DeliveryMetadata,
}

impl Delivery {
    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Only pending deliveries can be started.
    pub fn is_pending(&self) -> bool {
        self.status == DeliveryStatus::Pending
    }
}

// =============================================================================
// Employees
// =============================================================================

/// Roles an employee can be hired into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    Cashier,
    Driver,
    Manager,
}

impl std::fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmployeeRole::Cashier => write!(f, "cashier"),
            EmployeeRole::Driver => write!(f, "driver"),
            EmployeeRole::Manager => write!(f, "manager"),
        }
    }
}

impl std::str::FromStr for EmployeeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cashier" => Ok(EmployeeRole::Cashier),
            "driver" => Ok(EmployeeRole::Driver),
            "manager" => Ok(EmployeeRole::Manager),
            _ => Err(format!("Unknown employee role: {}", s)),
        }
    }
}

/// An employee row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub citizenid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub wage: Money,
    #[serde(default)]
    pub status: String,
}

// =============================================================================
// Statistics
// =============================================================================

/// Time-series statistics for the management dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShopStats {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "series")]
    pub sales: Vec<f64>,
    #[serde(default, deserialize_with = "series")]
    pub xp: Vec<f64>,
    #[serde(default, deserialize_with = "series")]
    pub deliveries: Vec<f64>,
}

fn series<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .map(|value| coerce::number_or(value, 0.0))
        .collect())
}

/// One column of the dashboard chart; heights are percent of the tallest value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartColumn {
    pub label: String,
    pub sales: f64,
    pub xp: f64,
    pub deliveries: f64,
    pub sales_height: u8,
    pub xp_height: u8,
    pub deliveries_height: u8,
}

/// Bars shorter than this are stretched so they stay visible.
const MIN_BAR_PERCENT: f64 = 8.0;

impl ShopStats {
    /// Scales every series against one shared maximum (at least 1).
    pub fn chart_columns(&self) -> Vec<ChartColumn> {
        let max = self
            .sales
            .iter()
            .chain(&self.xp)
            .chain(&self.deliveries)
            .copied()
            .fold(1.0_f64, f64::max);
        let height = |value: f64| -> u8 {
            if value <= 0.0 {
                return 0;
            }
            ((value / max) * 100.0).round().max(MIN_BAR_PERCENT).min(100.0) as u8
        };
        let at = |series: &[f64], index: usize| series.get(index).copied().unwrap_or(0.0);

        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let (sales, xp, deliveries) =
                    (at(&self.sales, index), at(&self.xp, index), at(&self.deliveries, index));
                ChartColumn {
                    label: if label.is_empty() { "-".to_string() } else { label.clone() },
                    sales,
                    xp,
                    deliveries,
                    sales_height: height(sales),
                    xp_height: height(xp),
                    deliveries_height: height(deliveries),
                }
            })
            .collect()
    }
}

// =============================================================================
// Shop Type Configuration
// =============================================================================

/// Per-type defaults (label, purchase and sell price).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopTypeConfig {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub purchase_price: Money,
    #[serde(default)]
    pub sell_price: Money,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Capabilities
// =============================================================================

/// Authorization flags supplied with `openShop` / `openManagement`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default, deserialize_with = "de::truthy")]
    pub is_owner: bool,
    #[serde(default, deserialize_with = "opt_truthy")]
    pub can_manage: Option<bool>,
    #[serde(default, deserialize_with = "de::truthy")]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizenid: Option<String>,
}

fn opt_truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::Null => None,
        other => Some(coerce::truthy(&other)),
    })
}

impl Capabilities {
    /// Admin-only flags, as granted by `openAdminOverview`.
    pub fn admin() -> Self {
        Capabilities {
            is_admin: true,
            ..Default::default()
        }
    }

    /// Whether management actions are permitted.
    pub fn can_manage(&self) -> bool {
        self.can_manage.unwrap_or(false)
    }
}

// =============================================================================
// Shop Snapshot
// =============================================================================

/// The authoritative shop representation pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSnapshot {
    pub identifier: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub shop_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default = "default_level", deserialize_with = "de::level_or_one")]
    pub level: u32,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub xp: i64,
    #[serde(default)]
    pub balance: Money,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub discount: i64,
    #[serde(default, deserialize_with = "de::map_or_empty")]
    pub inventory: BTreeMap<String, Category>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub employees: Vec<Employee>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub deliveries: Vec<Delivery>,
    #[serde(default, deserialize_with = "vehicle_map")]
    pub delivery_vehicles: BTreeMap<String, VehicleRecord>,
    /// Absent in many pushes; `None` until the merge defaults it.
    #[serde(default, deserialize_with = "de::opt_map_or_empty")]
    pub vehicle_ownership: Option<BTreeMap<String, VehicleOwnership>>,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub delivery_capacity_bonus: i64,
    #[serde(default)]
    pub stats: Option<ShopStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_config: Option<ShopTypeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Value>,
    #[serde(
        default,
        deserialize_with = "de::opt_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_price: Option<Money>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_level() -> u32 {
    1
}

/// A category view with its key.
#[derive(Debug, Clone, Copy)]
pub struct CategoryView<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub items: &'a [InventoryItem],
}

impl ShopSnapshot {
    /// An empty snapshot for the given identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        ShopSnapshot {
            identifier: identifier.into(),
            label: String::new(),
            shop_type: String::new(),
            owner: None,
            owner_name: None,
            level: 1,
            xp: 0,
            balance: Money::zero(),
            discount: 0,
            inventory: BTreeMap::new(),
            employees: Vec::new(),
            deliveries: Vec::new(),
            delivery_vehicles: BTreeMap::new(),
            vehicle_ownership: None,
            delivery_capacity_bonus: 0,
            stats: None,
            type_config: None,
            coords: None,
            heading: None,
            config: Value::Null,
            metadata: Value::Null,
            purchase_price: None,
            sell_price: None,
            extra: Map::new(),
        }
    }

    /// Categories in key order; a missing label falls back to the key.
    pub fn categories(&self) -> impl Iterator<Item = CategoryView<'_>> {
        self.inventory.iter().map(|(key, category)| CategoryView {
            key,
            label: if category.label.is_empty() { key } else { &category.label },
            items: &category.items,
        })
    }

    /// First category key, the default selection when a shop opens.
    pub fn first_category_key(&self) -> Option<&str> {
        self.inventory.keys().next().map(String::as_str)
    }

    /// All items across categories, paired with their category key.
    pub fn items(&self) -> impl Iterator<Item = (&str, &InventoryItem)> {
        self.inventory
            .iter()
            .flat_map(|(key, category)| category.items.iter().map(move |item| (key.as_str(), item)))
    }

    /// Looks up an item by id.
    pub fn item_by_id(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items()
            .map(|(_, item)| item)
            .find(|item| item.id == Some(id))
    }

    /// Looks up a delivery vehicle by key.
    pub fn vehicle(&self, key: &str) -> Option<&VehicleRecord> {
        self.delivery_vehicles.get(key)
    }

    /// Ownership entry for a vehicle, if any.
    pub fn ownership(&self, key: &str) -> Option<&VehicleOwnership> {
        self.vehicle_ownership.as_ref().and_then(|map| map.get(key))
    }

    /// Looks up a delivery by identifier.
    pub fn delivery(&self, identifier: &str) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.identifier == identifier)
    }

    /// True when no player owns the shop.
    pub fn is_unowned(&self) -> bool {
        self.owner.as_deref().map_or(true, str::is_empty)
    }

    /// The creator block written by the admin editor, if any.
    pub fn creator(&self) -> Option<&Map<String, Value>> {
        self.metadata.get("creator").and_then(Value::as_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ShopSnapshot {
        serde_json::from_value(json!({
            "identifier": "shop_1",
            "label": "Corner Store",
            "type": "general",
            "level": "3",
            "balance": 1200.5,
            "discount": 10,
            "inventory": {
                "food": {
                    "label": "Food",
                    "items": [
                        {"id": 1, "item": "bread", "label": "Bread", "quantity": 4, "base_price": 20},
                        {"id": 2, "item": "water", "label": "Water", "quantity": "7", "basePrice": 5, "overridePrice": 6}
                    ]
                },
                "drinks": {"items": null}
            },
            "deliveryVehicles": {
                "speedo": {"label": "Speedo", "capacity": 50, "minLevel": 2}
            },
            "vehicleOwnership": {"speedo": {"unlocked": 1, "purchasedAt": 1700000000}},
            "customField": {"kept": true}
        }))
        .unwrap()
    }

    #[test]
    fn test_snapshot_parses_loose_numbers() {
        let shop = sample();
        assert_eq!(shop.level, 3);
        assert_eq!(shop.balance.units(), 1200);
        let water = shop.item_by_id(2).unwrap();
        assert_eq!(water.quantity, 7);
        assert_eq!(water.list_price().units(), 6);
        let bread = shop.item_by_id(1).unwrap();
        assert_eq!(bread.base_price.units(), 20);
        assert_eq!(bread.override_price, None);
    }

    #[test]
    fn test_snapshot_defaults() {
        let shop: ShopSnapshot = serde_json::from_value(json!({"identifier": "x"})).unwrap();
        assert_eq!(shop.level, 1);
        assert!(shop.vehicle_ownership.is_none());
        assert!(shop.stats.is_none());
        assert!(shop.is_unowned());
    }

    #[test]
    fn test_empty_tables_encoded_as_arrays() {
        let shop: ShopSnapshot = serde_json::from_value(json!({
            "identifier": "x",
            "inventory": [],
            "deliveryVehicles": [],
            "vehicleOwnership": [],
            "heading": "90.0"
        }))
        .unwrap();
        assert!(shop.inventory.is_empty());
        assert!(shop.delivery_vehicles.is_empty());
        assert_eq!(shop.vehicle_ownership, Some(BTreeMap::new()));
        assert_eq!(shop.heading, Some(90.0));

        let shop: ShopSnapshot = serde_json::from_value(json!({
            "identifier": "x",
            "vehicleOwnership": null,
            "heading": "north"
        }))
        .unwrap();
        assert!(shop.vehicle_ownership.is_none());
        assert_eq!(shop.heading, None);
    }

    #[test]
    fn test_categories_fall_back_to_key() {
        let shop = sample();
        let labels: Vec<&str> = shop.categories().map(|c| c.label).collect();
        assert_eq!(labels, vec!["drinks", "Food"]);
        assert_eq!(shop.first_category_key(), Some("drinks"));
        assert_eq!(shop.items().count(), 2);
    }

    #[test]
    fn test_vehicle_map_uses_map_key() {
        let shop = sample();
        let speedo = shop.vehicle("speedo").unwrap();
        assert_eq!(speedo.key, "speedo");
        assert_eq!(speedo.label, "Speedo");
        assert_eq!(speedo.capacity, 50);
        assert_eq!(speedo.min_level, 2);
        let ownership = shop.ownership("speedo").unwrap();
        assert!(ownership.unlocked);
        assert_eq!(ownership.purchased_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let shop = sample();
        let value = serde_json::to_value(&shop).unwrap();
        assert_eq!(value["customField"], json!({"kept": true}));
        assert_eq!(value["type"], json!("general"));
    }

    #[test]
    fn test_chart_columns_scale_to_shared_max() {
        let stats: ShopStats = serde_json::from_value(json!({
            "labels": ["Mon", "", "Wed"],
            "sales": [200, 0, "x"],
            "xp": [50, 1, 100],
            "deliveries": [2]
        }))
        .unwrap();
        let columns = stats.chart_columns();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].sales_height, 100);
        assert_eq!(columns[0].xp_height, 25);
        // small positive values are stretched to stay visible
        assert_eq!(columns[0].deliveries_height, 8);
        assert_eq!(columns[1].label, "-");
        assert_eq!(columns[1].sales_height, 0);
        assert_eq!(columns[2].sales, 0.0);
        assert_eq!(columns[2].deliveries_height, 0);
    }

    #[test]
    fn test_delivery_helpers() {
        let delivery: Delivery = serde_json::from_value(json!({
            "identifier": "DEL-1",
            "vehicle_model": "speedo",
            "status": "pending",
            "items": [{"item": "bread", "quantity": 5}, {"item": "water", "quantity": "3"}]
        }))
        .unwrap();
        assert!(delivery.is_pending());
        assert_eq!(delivery.total_quantity(), 8);

        let odd: Delivery =
            serde_json::from_value(json!({"identifier": "DEL-2", "status": "en_route"})).unwrap();
        assert_eq!(odd.status, DeliveryStatus::Unknown);
        assert!(!odd.is_pending());
    }

    #[test]
    fn test_employee_role_parsing() {
        assert_eq!("Driver".parse::<EmployeeRole>().unwrap(), EmployeeRole::Driver);
        assert!("janitor".parse::<EmployeeRole>().is_err());
        assert_eq!(EmployeeRole::Manager.to_string(), "manager");
    }
}

//! Draft construction.
//!
//! A snapshot stores the editor's view in two places: the creator block
//! (`metadata.creator`) written by a previous save, and the live shop
//! config. The creator block wins wherever it says something.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use shop_core::coerce::{finite_number, first_number, first_number_opt, first_string, object};
use shop_core::vehicle::VehicleEntry;
use shop_core::{InventoryItem, Money, ShopSnapshot, ShopTypeConfig, VehicleRecord, VehicleTemplates};

use super::{Blip, Coords, GeoPoint, Ped, Route, ShopDraft, Zone};
use crate::config::TemplateSettings;

/// Builds the draft of an existing shop.
pub fn build_from_snapshot(
    shop: &ShopSnapshot,
    templates: &VehicleTemplates,
    settings: &TemplateSettings,
) -> ShopDraft {
    let empty = Map::new();
    let creator = shop.creator().unwrap_or(&empty);
    let config = shop.config.as_object().unwrap_or(&empty);
    let from_either = |key: &str| object(creator, key).or_else(|| object(config, key));

    let coords = base_coords(shop, creator);

    ShopDraft {
        identifier: shop.identifier.clone(),
        label: shop.label.clone(),
        shop_type: shop.shop_type.clone(),
        coords,
        ped: build_ped(from_either("ped").unwrap_or(&empty)),
        zone: build_zone(from_either("zone").unwrap_or(&empty), coords, settings),
        dropoffs: point_list(creator.get("dropoffs"), coords, false)
            .filter(|points| !points.is_empty())
            .unwrap_or_else(|| vec![GeoPoint::at(coords, shop.label.clone(), false)]),
        depots: point_list(creator.get("depots"), coords, true).unwrap_or_default(),
        vehicle_spawns: point_list(creator.get("vehicleSpawns"), coords, true).unwrap_or_default(),
        vehicles: build_vehicles(creator.get("vehicles"), templates),
        products: build_products(creator.get("products")),
        purchase_price: shop
            .purchase_price
            .unwrap_or_else(|| Money::from_number(first_number(creator, &["purchasePrice"], 0.0))),
        sell_price: shop
            .sell_price
            .unwrap_or_else(|| Money::from_number(first_number(creator, &["sellPrice"], 0.0))),
        inventory: flatten_inventory(shop),
        routes: build_routes(creator.get("routes"), coords),
        blip: build_blip(creator, config, &shop.label, settings),
        is_new: false,
    }
}

/// Builds a blank draft for a new shop of `type_key` (or the first type).
pub fn build_new(
    type_key: Option<&str>,
    shop_types: &BTreeMap<String, ShopTypeConfig>,
    coords: Coords,
    settings: &TemplateSettings,
) -> ShopDraft {
    let shop_type = type_key
        .map(str::to_string)
        .or_else(|| shop_types.keys().next().cloned())
        .unwrap_or_default();
    let type_config = shop_types.get(&shop_type);

    ShopDraft {
        identifier: String::new(),
        label: String::new(),
        coords,
        ped: Ped {
            model: settings.ped_model.clone(),
            scenario: String::new(),
        },
        zone: Zone {
            length: settings.zone_length,
            width: settings.zone_width,
            min_z: coords.z - settings.zone_half_height,
            max_z: coords.z + settings.zone_half_height,
        },
        dropoffs: vec![GeoPoint::at(coords, "", false)],
        depots: Vec::new(),
        vehicle_spawns: vec![GeoPoint::at(coords, "", true)],
        vehicles: Vec::new(),
        products: Vec::new(),
        purchase_price: type_config.map(|t| t.purchase_price).unwrap_or_default(),
        sell_price: type_config.map(|t| t.sell_price).unwrap_or_default(),
        inventory: Vec::new(),
        routes: Vec::new(),
        blip: Blip {
            enabled: false,
            sprite: settings.blip_sprite,
            color: settings.blip_color,
            scale: settings.blip_scale,
            label: String::new(),
            short_range: settings.blip_short_range,
        },
        shop_type,
        is_new: true,
    }
}

// =============================================================================
// Pieces
// =============================================================================

fn base_coords(shop: &ShopSnapshot, creator: &Map<String, Value>) -> Coords {
    let stored = object(creator, "coords").or_else(|| shop.coords.as_ref().and_then(Value::as_object));
    match stored {
        Some(obj) => Coords {
            heading: first_number_opt(obj, &["heading", "w"])
                .or(shop.heading)
                .unwrap_or(0.0),
            ..Coords::from_object(obj)
        },
        None => Coords::new(0.0, 0.0, 0.0, shop.heading.unwrap_or(0.0)),
    }
}

fn build_ped(obj: &Map<String, Value>) -> Ped {
    Ped {
        model: first_string(obj, &["model"]).unwrap_or_default(),
        scenario: first_string(obj, &["scenario"]).unwrap_or_default(),
    }
}

fn build_zone(obj: &Map<String, Value>, coords: Coords, settings: &TemplateSettings) -> Zone {
    Zone {
        length: first_number(obj, &["length"], settings.zone_length),
        width: first_number(obj, &["width"], settings.zone_width),
        min_z: first_number(obj, &["minZ"], coords.z - settings.zone_half_height),
        max_z: first_number(obj, &["maxZ"], coords.z + settings.zone_half_height),
    }
}

/// `None` when the value is not a list.
fn point_list(value: Option<&Value>, base: Coords, with_heading: bool) -> Option<Vec<GeoPoint>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .map(|item| GeoPoint::from_value(item, base, with_heading))
            .collect(),
    )
}

fn build_vehicles(value: Option<&Value>, templates: &VehicleTemplates) -> Vec<VehicleRecord> {
    let mut seen = BTreeSet::new();
    value
        .and_then(Value::as_array)
        .map(|entries| entries.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(VehicleEntry::from_value)
        .filter_map(|entry| entry.resolve(templates))
        .filter(|record| seen.insert(record.key.clone()))
        .collect()
}

fn build_products(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|entries| entries.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Every item across categories, with its category key and list price made
/// explicit, ordered by display name.
fn flatten_inventory(shop: &ShopSnapshot) -> Vec<InventoryItem> {
    let mut items: Vec<InventoryItem> = shop
        .items()
        .map(|(category, item)| InventoryItem {
            category: category.to_string(),
            override_price: Some(item.list_price()),
            ..item.clone()
        })
        .collect();
    items.sort_by(|a, b| {
        a.display_name()
            .cmp(b.display_name())
            .then_with(|| a.item.cmp(&b.item))
    });
    items
}

fn build_routes(value: Option<&Value>, base: Coords) -> Vec<Route> {
    value
        .and_then(Value::as_array)
        .map(|entries| entries.as_slice())
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let obj = entry.as_object();
            Route {
                label: obj
                    .and_then(|obj| first_string(obj, &["label"]))
                    .unwrap_or_else(|| format!("Route {}", index + 1)),
                points: point_list(obj.and_then(|obj| obj.get("points")), base, false)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn build_blip(
    creator: &Map<String, Value>,
    config: &Map<String, Value>,
    shop_label: &str,
    settings: &TemplateSettings,
) -> Blip {
    let empty = Map::new();
    let disabled = creator.get("blip") == Some(&Value::Bool(false));
    let source = object(creator, "blip")
        .or_else(|| object(config, "blip"))
        .unwrap_or(&empty);
    let configured = ["sprite", "color", "label", "scale"]
        .iter()
        .any(|key| source.get(*key).is_some_and(shop_core::coerce::truthy));

    Blip {
        enabled: !disabled && configured,
        sprite: first_number(source, &["sprite"], settings.blip_sprite as f64).trunc() as i64,
        color: first_number(source, &["color"], settings.blip_color as f64).trunc() as i64,
        scale: source
            .get("scale")
            .and_then(finite_number)
            .unwrap_or(settings.blip_scale),
        label: first_string(source, &["label"]).unwrap_or_else(|| shop_label.to_string()),
        short_range: source.get("shortRange") != Some(&Value::Bool(false)),
    }
}

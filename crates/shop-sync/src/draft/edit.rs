//! Draft edits.
//!
//! Every edit goes through [`DraftReconciler::edit`]: it either applies in
//! full and marks the draft dirty, or fails and changes nothing. Field
//! edits take the raw input value and coerce it here, so a half-typed
//! number never leaves a non-numeric field behind.

use serde_json::{Map, Value};
use shop_core::coerce::{self, finite_number, first_string, number_or, truthy};
use shop_core::vehicle::VehicleEntry;
use shop_core::{CoreError, InventoryItem, Money, ValidationError, VehicleRecord};
use tracing::debug;

use super::{Coords, DraftReconciler, EditContext, GeoPoint, Route, ShopDraft};
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Targets
// =============================================================================

/// The point lists of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointList {
    Dropoffs,
    Depots,
    VehicleSpawns,
}

impl PointList {
    fn name(self) -> &'static str {
        match self {
            PointList::Dropoffs => "dropoffs",
            PointList::Depots => "depots",
            PointList::VehicleSpawns => "vehicleSpawns",
        }
    }

    /// Dropoffs are positions only; depots and spawns face a direction.
    pub fn has_heading(self) -> bool {
        !matches!(self, PointList::Dropoffs)
    }

    fn of(self, draft: &mut ShopDraft) -> &mut Vec<GeoPoint> {
        match self {
            PointList::Dropoffs => &mut draft.dropoffs,
            PointList::Depots => &mut draft.depots,
            PointList::VehicleSpawns => &mut draft.vehicle_spawns,
        }
    }
}

/// The nested objects of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Coords,
    Ped,
    Zone,
    Blip,
}

fn at<'a, T>(list: &'a mut [T], name: &'static str, index: usize) -> SyncResult<&'a mut T> {
    list.get_mut(index)
        .ok_or(SyncError::IndexOutOfRange { list: name, index })
}

fn remove_at<T>(list: &mut Vec<T>, name: &'static str, index: usize) -> SyncResult<T> {
    if index >= list.len() {
        return Err(SyncError::IndexOutOfRange { list: name, index });
    }
    Ok(list.remove(index))
}

fn unknown_field(field: &str, allowed: &[&str]) -> SyncError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
    .into()
}

/// Text input; numbers are rendered, anything else is empty.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn int(value: &Value) -> i64 {
    number_or(value, 0.0).trunc() as i64
}

/// A positive number, or `fallback` for zero, blanks and garbage.
fn nonzero_or(value: &Value, fallback: f64) -> f64 {
    finite_number(value).filter(|n| *n != 0.0).unwrap_or(fallback)
}

fn set_point_field(point: &mut GeoPoint, key: &str, value: &Value) -> SyncResult<()> {
    match key {
        "x" => point.x = number_or(value, 0.0),
        "y" => point.y = number_or(value, 0.0),
        "z" => point.z = number_or(value, 0.0),
        "heading" => point.heading = Some(number_or(value, 0.0)),
        "label" => point.label = text(value),
        other => return Err(unknown_field(other, &["x", "y", "z", "heading", "label"])),
    }
    Ok(())
}

fn default_depot(context: &EditContext<'_>, coords: Coords) -> GeoPoint {
    match context.catalog.depots.first() {
        Some(depot) => {
            let empty = Map::new();
            let obj = depot.as_object().unwrap_or(&empty);
            let position = coerce::object(obj, "coords").map(|c| Value::Object(c.clone()));
            let mut point = GeoPoint::from_value(position.as_ref().unwrap_or(depot), coords, true);
            if let Some(heading) = coerce::first_number_opt(obj, &["heading", "w"]) {
                point.heading = Some(heading);
            }
            point.label = first_string(obj, &["label"]).unwrap_or_default();
            point
        }
        None => GeoPoint::at(coords, "", true),
    }
}

// =============================================================================
// Edits
// =============================================================================

impl DraftReconciler {
    // ----- Scalars -----

    /// Sets a top-level field. Changing the type clears the product list.
    pub fn set_field(&mut self, key: &str, value: &Value) -> SyncResult<()> {
        self.edit(|draft, _| {
            match key {
                "identifier" => draft.identifier = text(value),
                "label" => draft.label = text(value),
                "type" => {
                    draft.shop_type = text(value);
                    draft.products.clear();
                }
                "purchasePrice" => draft.purchase_price = Money::from_number(number_or(value, 0.0)),
                "sellPrice" => draft.sell_price = Money::from_number(number_or(value, 0.0)),
                other => {
                    return Err(unknown_field(
                        other,
                        &["identifier", "label", "type", "purchasePrice", "sellPrice"],
                    ))
                }
            }
            Ok(())
        })
    }

    /// Sets a field of `coords`, `ped`, `zone` or `blip`.
    pub fn set_group_field(&mut self, group: GroupField, key: &str, value: &Value) -> SyncResult<()> {
        self.edit(|draft, context| {
            let settings = context.settings;
            match (group, key) {
                (GroupField::Coords, "x") => draft.coords.x = number_or(value, 0.0),
                (GroupField::Coords, "y") => draft.coords.y = number_or(value, 0.0),
                (GroupField::Coords, "z") => draft.coords.z = number_or(value, 0.0),
                (GroupField::Coords, "heading") => draft.coords.heading = number_or(value, 0.0),
                (GroupField::Coords, other) => {
                    return Err(unknown_field(other, &["x", "y", "z", "heading"]))
                }

                (GroupField::Ped, "model") => draft.ped.model = text(value),
                (GroupField::Ped, "scenario") => draft.ped.scenario = text(value),
                (GroupField::Ped, other) => return Err(unknown_field(other, &["model", "scenario"])),

                (GroupField::Zone, "length") => draft.zone.length = number_or(value, 0.0),
                (GroupField::Zone, "width") => draft.zone.width = number_or(value, 0.0),
                (GroupField::Zone, "minZ") => draft.zone.min_z = number_or(value, 0.0),
                (GroupField::Zone, "maxZ") => draft.zone.max_z = number_or(value, 0.0),
                (GroupField::Zone, other) => {
                    return Err(unknown_field(other, &["length", "width", "minZ", "maxZ"]))
                }

                (GroupField::Blip, "enabled") => draft.blip.enabled = truthy(value),
                (GroupField::Blip, "sprite") => {
                    draft.blip.sprite = nonzero_or(value, settings.blip_sprite as f64).trunc() as i64
                }
                (GroupField::Blip, "color") => {
                    draft.blip.color = nonzero_or(value, settings.blip_color as f64).trunc() as i64
                }
                (GroupField::Blip, "scale") => draft.blip.scale = nonzero_or(value, settings.blip_scale),
                (GroupField::Blip, "label") => draft.blip.label = text(value),
                (GroupField::Blip, "shortRange") => draft.blip.short_range = truthy(value),
                (GroupField::Blip, other) => {
                    return Err(unknown_field(
                        other,
                        &["enabled", "sprite", "color", "scale", "label", "shortRange"],
                    ))
                }
            }
            Ok(())
        })
    }

    /// Adds or removes a product category.
    pub fn toggle_product(&mut self, product: &str, enabled: bool) -> SyncResult<()> {
        self.edit(|draft, _| {
            let present = draft.products.iter().any(|p| p == product);
            if enabled && !present {
                draft.products.push(product.to_string());
            } else if !enabled {
                draft.products.retain(|p| p != product);
            }
            Ok(())
        })
    }

    // ----- Point lists -----

    /// Appends a point at `coords`, or at the default for the list.
    ///
    /// New depots default to the first catalog depot; everything else to
    /// the draft's own position.
    pub fn add_point(&mut self, list: PointList, coords: Option<Coords>) -> SyncResult<usize> {
        self.edit(|draft, context| {
            let point = match (coords, list) {
                (Some(coords), _) => GeoPoint::at(coords, "", list.has_heading()),
                (None, PointList::Depots) => default_depot(context, draft.coords),
                (None, _) => GeoPoint::at(draft.coords, "", list.has_heading()),
            };
            let points = list.of(draft);
            points.push(point);
            Ok(points.len() - 1)
        })
    }

    pub fn remove_point(&mut self, list: PointList, index: usize) -> SyncResult<()> {
        self.edit(|draft, _| remove_at(list.of(draft), list.name(), index).map(drop))
    }

    pub fn set_point_field(&mut self, list: PointList, index: usize, key: &str, value: &Value) -> SyncResult<()> {
        self.edit(|draft, _| set_point_field(at(list.of(draft), list.name(), index)?, key, value))
    }

    // ----- Inventory -----

    pub fn add_item(&mut self) -> SyncResult<usize> {
        self.edit(|draft, _| {
            draft.inventory.push(InventoryItem::blank());
            Ok(draft.inventory.len() - 1)
        })
    }

    pub fn remove_item(&mut self, index: usize) -> SyncResult<()> {
        self.edit(|draft, _| remove_at(&mut draft.inventory, "inventory", index).map(drop))
    }

    pub fn set_item_field(&mut self, index: usize, key: &str, value: &Value) -> SyncResult<()> {
        self.edit(|draft, _| {
            let item = at(&mut draft.inventory, "inventory", index)?;
            match key {
                "id" => {
                    item.id = finite_number(value)
                        .filter(|id| *id != 0.0)
                        .map(|id| id.trunc() as i64)
                }
                "item" => item.item = text(value),
                "label" => item.label = text(value),
                "icon" => item.icon = text(value),
                "category" => item.category = text(value),
                "quantity" => item.quantity = int(value),
                "basePrice" => item.base_price = Money::from_number(number_or(value, 0.0)),
                "overridePrice" => item.override_price = Some(Money::from_number(number_or(value, 0.0))),
                "discount" => item.discount = int(value),
                "minLevel" => item.min_level = coerce::level(number_or(value, 1.0)),
                other => {
                    return Err(unknown_field(
                        other,
                        &[
                            "id", "item", "label", "icon", "category", "quantity",
                            "basePrice", "overridePrice", "discount", "minLevel",
                        ],
                    ))
                }
            }
            Ok(())
        })
    }

    // ----- Vehicles -----

    /// Adds the template `key` as a vehicle.
    ///
    /// Fails with `VehicleNotFound` for an unknown template and with a
    /// `Duplicate` validation error when the draft already lists it.
    pub fn add_vehicle_from_template(&mut self, key: &str) -> SyncResult<()> {
        self.edit(|draft, context| {
            let template = context
                .catalog
                .vehicle_templates
                .get(key)
                .ok_or_else(|| CoreError::VehicleNotFound(key.to_string()))?;
            if draft.has_vehicle(key) {
                return Err(ValidationError::Duplicate {
                    field: "vehicle".into(),
                    value: key.to_string(),
                }
                .into());
            }

            let mut inline = template.as_object().cloned().unwrap_or_default();
            inline.insert("key".into(), Value::String(key.to_string()));
            let record = VehicleEntry::Inline(inline)
                .resolve(&context.catalog.vehicle_templates)
                .ok_or_else(|| CoreError::VehicleNotFound(key.to_string()))?;

            debug!(vehicle = %key, "Vehicle added from template");
            draft.vehicles.push(record);
            Ok(())
        })
    }

    pub fn add_manual_vehicle(&mut self) -> SyncResult<usize> {
        self.edit(|draft, _| {
            draft.vehicles.push(VehicleRecord::blank());
            Ok(draft.vehicles.len() - 1)
        })
    }

    pub fn remove_vehicle(&mut self, index: usize) -> SyncResult<()> {
        self.edit(|draft, _| remove_at(&mut draft.vehicles, "vehicles", index).map(drop))
    }

    pub fn set_vehicle_field(&mut self, index: usize, key: &str, value: &Value) -> SyncResult<()> {
        self.edit(|draft, _| {
            let vehicle = at(&mut draft.vehicles, "vehicles", index)?;
            match key {
                "key" => vehicle.key = text(value),
                "model" => vehicle.model = text(value),
                "label" => vehicle.label = text(value),
                "icon" => vehicle.icon = Some(text(value)).filter(|s| !s.is_empty()),
                "price" => vehicle.price = Money::from_number(number_or(value, 0.0)),
                "minLevel" => vehicle.min_level = coerce::level(number_or(value, 1.0)),
                "capacity" => vehicle.capacity = int(value),
                "trunk" => vehicle.trunk = int(value),
                "fuelModifier" => vehicle.set_fuel_modifier(number_or(value, 1.0)),
                other => {
                    return Err(unknown_field(
                        other,
                        &[
                            "key", "model", "label", "icon", "price", "minLevel", "capacity",
                            "trunk", "fuelModifier",
                        ],
                    ))
                }
            }
            Ok(())
        })
    }

    // ----- Routes -----

    /// Appends a route labelled `Route N`, with a start point when `coords`
    /// is given.
    pub fn add_route(&mut self, coords: Option<Coords>) -> SyncResult<usize> {
        self.edit(|draft, _| {
            let label = format!("Route {}", draft.routes.len() + 1);
            let points = coords
                .map(|coords| vec![GeoPoint::at(coords, "Start", false)])
                .unwrap_or_default();
            draft.routes.push(Route { label, points });
            Ok(draft.routes.len() - 1)
        })
    }

    pub fn remove_route(&mut self, index: usize) -> SyncResult<()> {
        self.edit(|draft, _| remove_at(&mut draft.routes, "routes", index).map(drop))
    }

    pub fn set_route_label(&mut self, index: usize, label: &str) -> SyncResult<()> {
        self.edit(|draft, _| {
            at(&mut draft.routes, "routes", index)?.label = label.to_string();
            Ok(())
        })
    }

    /// Appends a stop to a route, at `coords` or the draft's position.
    pub fn add_route_point(&mut self, route: usize, coords: Option<Coords>) -> SyncResult<usize> {
        self.edit(|draft, _| {
            let position = coords.unwrap_or(draft.coords);
            let route = at(&mut draft.routes, "routes", route)?;
            route.points.push(GeoPoint::at(position, "", false));
            Ok(route.points.len() - 1)
        })
    }

    pub fn remove_route_point(&mut self, route: usize, point: usize) -> SyncResult<()> {
        self.edit(|draft, _| {
            let route = at(&mut draft.routes, "routes", route)?;
            remove_at(&mut route.points, "route points", point).map(drop)
        })
    }

    pub fn set_route_point_field(
        &mut self,
        route: usize,
        point: usize,
        key: &str,
        value: &Value,
    ) -> SyncResult<()> {
        self.edit(|draft, _| {
            let route = at(&mut draft.routes, "routes", route)?;
            set_point_field(at(&mut route.points, "route points", point)?, key, value)
        })
    }

    // ----- Position capture -----

    /// Moves the shop to `coords` and re-centres the zone on it.
    pub fn capture_coords(&mut self, coords: Coords) -> SyncResult<()> {
        self.edit(|draft, _| {
            draft.coords = coords;
            draft.zone.recenter(coords.z);
            Ok(())
        })
    }

    /// Re-centres the zone on `coords` and takes its height.
    pub fn capture_zone(&mut self, coords: Coords) -> SyncResult<()> {
        self.edit(|draft, _| {
            draft.zone.recenter(coords.z);
            draft.coords.z = coords.z;
            Ok(())
        })
    }

    /// Moves one point of a list to `coords`.
    pub fn capture_point(&mut self, list: PointList, index: usize, coords: Coords) -> SyncResult<()> {
        self.edit(|draft, _| {
            at(list.of(draft), list.name(), index)?.move_to(coords, list.has_heading());
            Ok(())
        })
    }

    /// Moves one route stop to `coords`.
    pub fn capture_route_point(&mut self, route: usize, point: usize, coords: Coords) -> SyncResult<()> {
        self.edit(|draft, _| {
            let route = at(&mut draft.routes, "routes", route)?;
            at(&mut route.points, "route points", point)?.move_to(coords, false);
            Ok(())
        })
    }
}

//! # Draft Reconciler
//!
//! The admin console edits a local draft of one shop's configuration while
//! authoritative catalog pushes keep arriving.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Draft States                                      │
//! │                                                                         │
//! │  ┌─────────┐  set_admin_data   ┌──────────────────┐                    │
//! │  │ NoDraft │ ────────────────► │ ViewingDashboard │ ◄─── show_dashboard │
//! │  └─────────┘                   └────────┬─────────┘       cancel_create │
//! │       ▲                                 │                 (no selection)│
//! │       │ clear                select_shop│      start_create             │
//! │       │                                 ▼           │                   │
//! │       │                       ┌──────────────────┐  │                   │
//! │       │                       │ EditingExisting  │  │                   │
//! │       │                       └────────┬─────────┘  │                   │
//! │       │                                │            ▼                   │
//! │       │                     start_create┌──────────────────┐            │
//! │       └─────────────────────────────────┤   CreatingNew    │            │
//! │                                         └──────────────────┘            │
//! │                                                                         │
//! │  Any edit sets dirty. A catalog push re-derives selection and draft,   │
//! │  and clears create mode and dirty.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submodules
//! - [`normalize`] - building drafts from snapshots and type defaults
//! - [`edit`] - field, list and capture edits
//! - [`save`] - submission and reply reconciliation

pub mod edit;
pub mod normalize;
pub mod save;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shop_core::coerce::{first_number, first_number_opt, first_string, object};
use shop_core::{InventoryItem, Money, ShopSnapshot, ShopTypeConfig, VehicleRecord, VehicleTemplates};
use tracing::{debug, info};

use crate::config::TemplateSettings;
use crate::error::{SyncError, SyncResult};
use crate::protocol::AdminOverview;

pub use edit::{GroupField, PointList};
pub use save::SaveTicket;

// =============================================================================
// Geometry
// =============================================================================

/// A world position with heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub heading: f64,
}

impl Coords {
    pub fn new(x: f64, y: f64, z: f64, heading: f64) -> Self {
        Coords { x, y, z, heading }
    }

    /// Reads a loose position; heading comes from `heading` or `w`.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Coords {
            x: first_number(obj, &["x"], 0.0),
            y: first_number(obj, &["y"], 0.0),
            z: first_number(obj, &["z"], 0.0),
            heading: first_number(obj, &["heading", "w"], 0.0),
        }
    }
}

/// A labelled point: dropoff, depot, vehicle spawn or route stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default)]
    pub label: String,
}

impl GeoPoint {
    /// A point at `coords`, keeping the heading only when asked to.
    pub fn at(coords: Coords, label: impl Into<String>, with_heading: bool) -> Self {
        GeoPoint {
            x: coords.x,
            y: coords.y,
            z: coords.z,
            heading: with_heading.then_some(coords.heading),
            label: label.into(),
        }
    }

    /// Reads a loose point.
    ///
    /// Each axis is taken from the point itself, then from a nested
    /// `coords` object, then from `base`. Heading is read the same way
    /// (`heading` or `w`) when `with_heading` is set.
    pub fn from_value(value: &Value, base: Coords, with_heading: bool) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);
        let nested = object(obj, "coords").unwrap_or(&empty);
        let axis = |keys: &[&str], fallback: f64| {
            first_number_opt(obj, keys)
                .or_else(|| first_number_opt(nested, keys))
                .unwrap_or(fallback)
        };

        GeoPoint {
            x: axis(&["x"], base.x),
            y: axis(&["y"], base.y),
            z: axis(&["z"], base.z),
            heading: with_heading.then(|| axis(&["heading", "w"], base.heading)),
            label: first_string(obj, &["label"]).unwrap_or_default(),
        }
    }

    /// Moves the point, keeping its label.
    pub fn move_to(&mut self, coords: Coords, with_heading: bool) {
        self.x = coords.x;
        self.y = coords.y;
        self.z = coords.z;
        if with_heading {
            self.heading = Some(coords.heading);
        }
    }
}

/// The shopkeeper ped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ped {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub scenario: String,
}

/// The interaction zone around the shop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub length: f64,
    pub width: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Zone {
    /// Re-centres the vertical bounds on `z`, at least one unit each way.
    pub fn recenter(&mut self, z: f64) {
        let half = (self.length / 2.0).max(1.0);
        self.min_z = z - half;
        self.max_z = z + half;
    }
}

/// Map marker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blip {
    pub enabled: bool,
    pub sprite: i64,
    pub color: i64,
    pub scale: f64,
    #[serde(default)]
    pub label: String,
    pub short_range: bool,
}

/// A delivery route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub points: Vec<GeoPoint>,
}

// =============================================================================
// Shop Draft
// =============================================================================

/// The editable admin form of one shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDraft {
    pub identifier: String,
    pub label: String,
    #[serde(rename = "type")]
    pub shop_type: String,
    pub coords: Coords,
    pub ped: Ped,
    pub zone: Zone,
    pub dropoffs: Vec<GeoPoint>,
    pub depots: Vec<GeoPoint>,
    pub vehicle_spawns: Vec<GeoPoint>,
    pub vehicles: Vec<VehicleRecord>,
    pub products: Vec<String>,
    pub purchase_price: Money,
    pub sell_price: Money,
    pub inventory: Vec<InventoryItem>,
    pub routes: Vec<Route>,
    pub blip: Blip,
    pub is_new: bool,
}

impl ShopDraft {
    /// Whether a vehicle with `key` is already listed.
    pub fn has_vehicle(&self, key: &str) -> bool {
        self.vehicles.iter().any(|vehicle| vehicle.key == key)
    }
}

// =============================================================================
// Reconciler State
// =============================================================================

/// Which admin screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminView {
    #[default]
    Dashboard,
    Editor,
}

/// Where the reconciler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// No catalog has been loaded.
    NoDraft,
    /// Catalog loaded, nothing being edited.
    ViewingDashboard,
    /// Editing the draft of an existing shop.
    EditingExisting,
    /// Editing a shop that does not exist yet.
    CreatingNew,
}

/// The admin catalog as last pushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminCatalog {
    pub shops: Vec<ShopSnapshot>,
    pub shop_types: BTreeMap<String, ShopTypeConfig>,
    pub vehicle_templates: VehicleTemplates,
    pub depots: Vec<Value>,
}

impl AdminCatalog {
    pub fn from_overview(overview: AdminOverview) -> Self {
        let vehicle_templates = overview.templates();
        AdminCatalog {
            shops: overview.shops,
            shop_types: overview.shop_types,
            vehicle_templates,
            depots: overview.depots,
        }
    }

    pub fn shop(&self, identifier: &str) -> Option<&ShopSnapshot> {
        self.shops.iter().find(|shop| shop.identifier == identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.shops.iter().map(|shop| shop.identifier.as_str())
    }

    pub fn first_type_key(&self) -> Option<&str> {
        self.shop_types.keys().next().map(String::as_str)
    }
}

/// Holds the catalog, the selection and the draft being edited.
///
/// ## Invariants
/// - `create_mode` implies a draft with `is_new` set
/// - after any catalog push, `selected` names a shop in the catalog or is `None`
/// - failed edits leave both the draft and `dirty` untouched
#[derive(Debug, Clone)]
pub struct DraftReconciler {
    settings: TemplateSettings,
    loaded: bool,
    catalog: AdminCatalog,
    view: AdminView,
    selected: Option<String>,
    pending_selection: Option<String>,
    create_mode: bool,
    draft: Option<ShopDraft>,
    dirty: bool,
}

impl DraftReconciler {
    pub fn new(settings: TemplateSettings) -> Self {
        DraftReconciler {
            settings,
            loaded: false,
            catalog: AdminCatalog::default(),
            view: AdminView::Dashboard,
            selected: None,
            pending_selection: None,
            create_mode: false,
            draft: None,
            dirty: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> DraftState {
        match (&self.draft, self.create_mode) {
            (Some(_), true) => DraftState::CreatingNew,
            (Some(_), false) => DraftState::EditingExisting,
            (None, _) if self.loaded => DraftState::ViewingDashboard,
            (None, _) => DraftState::NoDraft,
        }
    }

    pub fn catalog(&self) -> &AdminCatalog {
        &self.catalog
    }

    pub fn view(&self) -> AdminView {
        self.view
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn pending_selection(&self) -> Option<&str> {
        self.pending_selection.as_deref()
    }

    pub fn draft(&self) -> Option<&ShopDraft> {
        self.draft.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_create_mode(&self) -> bool {
        self.create_mode
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    // =========================================================================
    // Catalog Pushes
    // =========================================================================

    /// Applies a catalog push.
    ///
    /// The selection survives when the shop it names is still present; a
    /// pending selection from a just-saved create takes precedence. In the
    /// editor the draft is rebuilt from the selected shop (falling back to
    /// the first one); with no shops at all the view drops to the dashboard.
    pub fn set_admin_data(&mut self, overview: AdminOverview) {
        self.catalog = AdminCatalog::from_overview(overview);
        self.loaded = true;

        let wanted = self.pending_selection.take().or_else(|| self.selected.take());
        self.selected = wanted.filter(|id| self.catalog.shop(id).is_some());
        self.create_mode = false;
        self.dirty = false;

        if self.view == AdminView::Editor {
            if self.selected.is_none() {
                self.selected = self.catalog.shops.first().map(|shop| shop.identifier.clone());
            }
            self.draft = self.build_selected();
            if self.draft.is_none() {
                self.view = AdminView::Dashboard;
            }
        } else {
            self.draft = None;
        }

        info!(
            shops = self.catalog.shops.len(),
            selected = ?self.selected,
            view = ?self.view,
            "Admin catalog applied"
        );
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Opens the editor on an existing shop, discarding any unsaved edits.
    pub fn select_shop(&mut self, identifier: &str) -> SyncResult<()> {
        let shop = self.catalog.shop(identifier).ok_or(SyncError::NoShop)?;
        let draft = normalize::build_from_snapshot(shop, &self.catalog.vehicle_templates, &self.settings);

        self.selected = Some(identifier.to_string());
        self.view = AdminView::Editor;
        self.create_mode = false;
        self.draft = Some(draft);
        self.dirty = false;
        debug!(shop = %identifier, "Shop selected for editing");
        Ok(())
    }

    /// Starts a new shop at `coords`, typed like the current draft.
    pub fn start_create(&mut self, coords: Option<Coords>) {
        let coords = coords
            .or_else(|| self.draft.as_ref().map(|draft| draft.coords))
            .unwrap_or_default();
        let type_key = self
            .draft
            .as_ref()
            .map(|draft| draft.shop_type.clone())
            .filter(|key| !key.is_empty());

        let draft = normalize::build_new(
            type_key.as_deref(),
            &self.catalog.shop_types,
            coords,
            &self.settings,
        );
        debug!(shop_type = %draft.shop_type, "Create flow started");

        self.view = AdminView::Editor;
        self.create_mode = true;
        self.dirty = true;
        self.pending_selection = None;
        self.draft = Some(draft);
    }

    /// Re-enters create mode for an unsaved new draft.
    pub fn resume_create(&mut self) -> SyncResult<()> {
        let draft = self.draft.as_ref().ok_or(SyncError::NoDraft)?;
        if draft.is_new {
            self.create_mode = true;
            self.view = AdminView::Editor;
        }
        Ok(())
    }

    /// Leaves create mode: back to the selected shop, or to the dashboard.
    pub fn cancel_create(&mut self) {
        self.create_mode = false;
        self.dirty = false;
        self.pending_selection = None;
        self.draft = self.build_selected();
        if self.draft.is_none() {
            self.view = AdminView::Dashboard;
        }
        debug!(selected = ?self.selected, "Create flow cancelled");
    }

    /// Returns to the dashboard, discarding the draft.
    pub fn show_dashboard(&mut self) {
        self.view = AdminView::Dashboard;
        self.create_mode = false;
        self.draft = None;
        self.dirty = false;
    }

    /// Drops everything, including the catalog.
    pub fn clear(&mut self) {
        *self = DraftReconciler::new(self.settings.clone());
    }

    fn build_selected(&self) -> Option<ShopDraft> {
        let shop = self.catalog.shop(self.selected.as_deref()?)?;
        Some(normalize::build_from_snapshot(
            shop,
            &self.catalog.vehicle_templates,
            &self.settings,
        ))
    }

    // =========================================================================
    // Edit Plumbing
    // =========================================================================

    /// Applies a fallible edit. On success the draft is marked dirty; on
    /// failure nothing changes.
    pub(crate) fn edit<T>(
        &mut self,
        apply: impl FnOnce(&mut ShopDraft, &EditContext<'_>) -> SyncResult<T>,
    ) -> SyncResult<T> {
        let current = self.draft.as_ref().ok_or(SyncError::NoDraft)?;
        let mut next = current.clone();
        let context = EditContext {
            catalog: &self.catalog,
            settings: &self.settings,
        };
        let out = apply(&mut next, &context)?;
        self.draft = Some(next);
        self.dirty = true;
        Ok(out)
    }
}

/// Read-only context handed to edits.
pub(crate) struct EditContext<'a> {
    pub catalog: &'a AdminCatalog,
    pub settings: &'a TemplateSettings,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_state() {
        let reconciler = DraftReconciler::new(TemplateSettings::default());
        assert_eq!(reconciler.state(), DraftState::NoDraft);
        assert_eq!(loaded().state(), DraftState::ViewingDashboard);
    }

    #[test]
    fn test_select_shop_builds_clean_draft() {
        let reconciler = editing("corner");
        assert_eq!(reconciler.state(), DraftState::EditingExisting);
        assert_eq!(reconciler.view(), AdminView::Editor);
        assert!(!reconciler.is_dirty());
        assert_eq!(reconciler.draft().unwrap().identifier, "corner");
    }

    #[test]
    fn test_select_unknown_shop() {
        let mut reconciler = loaded();
        assert!(matches!(reconciler.select_shop("nowhere"), Err(SyncError::NoShop)));
        assert_eq!(reconciler.state(), DraftState::ViewingDashboard);
    }

    #[test]
    fn test_push_keeps_selection_and_drops_edits() {
        let mut reconciler = editing("harbor");
        reconciler.edit(|draft, _| {
            draft.label = "Edited".into();
            Ok(())
        })
        .unwrap();
        assert!(reconciler.is_dirty());

        reconciler.set_admin_data(overview());
        assert_eq!(reconciler.selected(), Some("harbor"));
        assert_eq!(reconciler.draft().unwrap().label, "Harbor Goods");
        assert!(!reconciler.is_dirty());
    }

    #[test]
    fn test_push_without_selected_shop_falls_back_to_first() {
        let mut reconciler = editing("harbor");
        let mut overview = overview();
        overview.shops.retain(|shop| shop.identifier != "harbor");

        reconciler.set_admin_data(overview);
        assert_eq!(reconciler.selected(), Some("corner"));
        assert_eq!(reconciler.view(), AdminView::Editor);
    }

    #[test]
    fn test_push_with_no_shops_goes_to_dashboard() {
        let mut reconciler = editing("corner");
        reconciler.set_admin_data(AdminOverview::default());
        assert_eq!(reconciler.selected(), None);
        assert_eq!(reconciler.view(), AdminView::Dashboard);
        assert_eq!(reconciler.state(), DraftState::ViewingDashboard);
    }

    #[test]
    fn test_create_then_cancel_returns_to_selection() {
        let mut reconciler = editing("corner");
        reconciler.start_create(Some(Coords::new(1.0, 2.0, 3.0, 0.0)));
        assert_eq!(reconciler.state(), DraftState::CreatingNew);
        assert!(reconciler.is_dirty());
        assert_eq!(reconciler.draft().unwrap().shop_type, "general");

        reconciler.cancel_create();
        assert_eq!(reconciler.state(), DraftState::EditingExisting);
        assert_eq!(reconciler.draft().unwrap().identifier, "corner");
        assert!(!reconciler.is_dirty());
    }

    #[test]
    fn test_cancel_without_selection_goes_to_dashboard() {
        let mut reconciler = loaded();
        reconciler.start_create(None);
        reconciler.cancel_create();
        assert_eq!(reconciler.view(), AdminView::Dashboard);
        assert!(reconciler.draft().is_none());
    }

    #[test]
    fn test_cancelled_create_does_not_leak_into_next_selection() {
        let mut reconciler = editing("corner");
        reconciler.start_create(None);
        reconciler
            .edit(|draft, _| {
                draft.identifier = "ghost".into();
                draft.label = "Ghost".into();
                Ok(())
            })
            .unwrap();
        reconciler.cancel_create();
        reconciler.select_shop("harbor").unwrap();

        let draft = reconciler.draft().unwrap();
        assert_eq!(draft.identifier, "harbor");
        assert!(!draft.is_new);
        assert!(!reconciler.is_create_mode());
        assert!(!reconciler.is_dirty());
    }

    #[test]
    fn test_resume_create() {
        let mut reconciler = loaded();
        reconciler.start_create(None);
        reconciler.create_mode = false;
        reconciler.resume_create().unwrap();
        assert!(reconciler.is_create_mode());
    }

    #[test]
    fn test_failed_edit_leaves_draft_untouched() {
        let mut reconciler = editing("corner");
        let before = reconciler.draft().cloned();
        let result: SyncResult<()> = reconciler.edit(|draft, _| {
            draft.label = "half-applied".into();
            Err(SyncError::IndexOutOfRange {
                list: "routes",
                index: 3,
            })
        });
        assert!(result.is_err());
        assert_eq!(reconciler.draft().cloned(), before);
        assert!(!reconciler.is_dirty());
    }

    #[test]
    fn test_clear_drops_catalog() {
        let mut reconciler = editing("corner");
        reconciler.clear();
        assert_eq!(reconciler.state(), DraftState::NoDraft);
        assert!(reconciler.catalog().shops.is_empty());
    }

    #[test]
    fn test_geo_point_coalescing() {
        let base = Coords::new(1.0, 2.0, 3.0, 45.0);
        let point = GeoPoint::from_value(&json!({ "coords": { "x": 9 }, "y": 8, "w": 10 }), base, true);
        assert_eq!((point.x, point.y, point.z), (9.0, 8.0, 3.0));
        assert_eq!(point.heading, Some(10.0));

        let point = GeoPoint::from_value(&json!({ "label": "Back door" }), base, false);
        assert_eq!(point.heading, None);
        assert_eq!(point.label, "Back door");
        assert_eq!(point.x, 1.0);
    }

    #[test]
    fn test_zone_recenter() {
        let mut zone = Zone {
            length: 6.0,
            width: 2.0,
            min_z: 0.0,
            max_z: 0.0,
        };
        zone.recenter(10.0);
        assert_eq!((zone.min_z, zone.max_z), (7.0, 13.0));

        zone.length = 1.0;
        zone.recenter(10.0);
        assert_eq!((zone.min_z, zone.max_z), (9.0, 11.0));
    }
}

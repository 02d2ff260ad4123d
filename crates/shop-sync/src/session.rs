//! # Shop Session
//!
//! The event-driven core of the shop client: applies authoritative pushes,
//! owns every piece of session-scoped state, and turns user actions into
//! validated outbound requests.
//!
//! ## Event Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ShopSession::handle                                │
//! │                                                                         │
//! │  openShop ────────────► merge snapshot, reset cart/category/tab        │
//! │  openManagement ──────► merge snapshot, keep cart                      │
//! │  openAdminOverview ───► admin flags, catalog → DraftReconciler         │
//! │  refreshShop ─────────► merge with statistics carry-over               │
//! │  refreshDeliveries ───► patch deliveries (only with a loaded shop)     │
//! │  notify ──────────────► NotificationCenter                             │
//! │  close ───────────────► SessionState::new()  (one assignment)          │
//! │                                                                         │
//! │  After every snapshot change: sync_access_flags()                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! All mutable state lives in one [`SessionState`] value. Teardown replaces
//! it wholesale, so nothing from a closed session can leak into the next.
//! Handlers run to completion one at a time; the only suspension points are
//! calls through the [`ShopGateway`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_core::capacity::{CapacityCheck, CapacityPlanner, ManifestDraft, ManifestRow};
use shop_core::validation;
use shop_core::{Capabilities, CoreError, EmployeeRole, ItemId, ShopSnapshot, ValidationError};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::cart::{Cart, PaymentMethod};
use crate::config::SessionConfig;
use crate::draft::{Coords, DraftReconciler, PointList, SaveTicket};
use crate::error::{SyncError, SyncResult};
use crate::gateway::ShopGateway;
use crate::merge::{apply_deliveries, merge_snapshot};
use crate::notify::{NotificationCenter, NotificationKind};
use crate::protocol::{InboundEvent, OutboundRequest, SaveResponse};

// =============================================================================
// Views
// =============================================================================

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionView {
    #[default]
    Shop,
    Management,
    Admin,
}

/// Tab inside the management screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ManagementTab {
    #[default]
    Dashboard,
    Inventory,
    Employees,
    Deliveries,
    Vehicles,
    Finance,
}

/// Where a captured player position goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// The shop position; the zone follows.
    Coords,
    /// The zone height.
    Zone,
    /// One point of a point list.
    Point(PointList, usize),
    /// One stop of a route.
    RoutePoint { route: usize, point: usize },
}

// =============================================================================
// Session State
// =============================================================================

/// Everything a session owns. Built fresh on start and on teardown.
#[derive(Debug, Clone)]
pub struct SessionState {
    visible: bool,
    view: SessionView,
    snapshot: Option<ShopSnapshot>,
    meta: Capabilities,
    cart: Cart,
    selected_category: Option<String>,
    management_tab: ManagementTab,
    manifest: ManifestDraft,
    notifications: NotificationCenter,
    admin: DraftReconciler,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        SessionState {
            visible: false,
            view: SessionView::Shop,
            snapshot: None,
            meta: Capabilities::default(),
            cart: Cart::new(),
            selected_category: None,
            management_tab: ManagementTab::Dashboard,
            manifest: fresh_manifest(config),
            notifications: NotificationCenter::new(config.notifications.min_lifetime_ms),
            admin: DraftReconciler::new(config.template.clone()),
        }
    }
}

fn fresh_manifest(config: &SessionConfig) -> ManifestDraft {
    let mut manifest = ManifestDraft::default();
    manifest.push_row(config.management.default_manifest_quantity);
    manifest
}

// =============================================================================
// Session
// =============================================================================

/// One client session against one authoritative boundary.
pub struct ShopSession<G: ShopGateway> {
    config: SessionConfig,
    gateway: G,
    state: SessionState,
}

impl<G: ShopGateway> ShopSession<G> {
    pub fn new(config: SessionConfig, gateway: G) -> Self {
        let state = SessionState::new(&config);
        ShopSession {
            config,
            gateway,
            state,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn view(&self) -> SessionView {
        self.state.view
    }

    pub fn snapshot(&self) -> Option<&ShopSnapshot> {
        self.state.snapshot.as_ref()
    }

    pub fn meta(&self) -> &Capabilities {
        &self.state.meta
    }

    pub fn cart(&self) -> &Cart {
        &self.state.cart
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.state.selected_category.as_deref()
    }

    pub fn management_tab(&self) -> ManagementTab {
        self.state.management_tab
    }

    pub fn manifest(&self) -> &ManifestDraft {
        &self.state.manifest
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.state.notifications
    }

    pub fn admin(&self) -> &DraftReconciler {
        &self.state.admin
    }

    /// Direct access to the draft for field and list edits.
    pub fn admin_mut(&mut self) -> &mut DraftReconciler {
        &mut self.state.admin
    }

    // =========================================================================
    // Inbound Events
    // =========================================================================

    /// Parses and applies a raw inbound frame.
    pub fn handle_frame(&mut self, frame: Value) -> SyncResult<()> {
        let event = InboundEvent::from_frame(frame)?;
        self.handle(event);
        Ok(())
    }

    /// Applies one authoritative event.
    pub fn handle(&mut self, event: InboundEvent) {
        debug!(action = event.action(), "Handling inbound event");
        match event {
            InboundEvent::OpenShop { shop, meta } => {
                info!(shop = %shop.identifier, "Opening shop");
                self.state.meta = meta;
                self.state.snapshot = Some(merge_snapshot(None, shop));
                self.state.cart.clear();
                self.state.management_tab = ManagementTab::Dashboard;
                self.state.manifest = fresh_manifest(&self.config);
                self.state.selected_category = self.first_category();
                self.state.visible = true;
                self.sync_access_flags();
                self.state.view = SessionView::Shop;
            }
            InboundEvent::OpenManagement { shop, meta } => {
                info!(shop = %shop.identifier, "Opening management");
                self.state.meta = meta;
                self.state.snapshot = Some(merge_snapshot(None, shop));
                self.state.management_tab = ManagementTab::Dashboard;
                self.ensure_category();
                self.state.visible = true;
                self.sync_access_flags();
                self.set_view(SessionView::Management);
            }
            InboundEvent::OpenAdminOverview(overview) => {
                info!(shops = overview.shops.len(), "Opening admin console");
                self.state.meta = Capabilities::admin();
                self.state.visible = true;
                self.state.view = SessionView::Admin;
                self.state.admin.show_dashboard();
                self.state.admin.set_admin_data(overview);
            }
            InboundEvent::RefreshShop { shop } => {
                debug!(shop = %shop.identifier, "Refreshing snapshot");
                let merged = merge_snapshot(self.state.snapshot.as_ref(), shop);
                self.state.snapshot = Some(merged);
                self.ensure_category();
                self.sync_access_flags();
                let view = self.state.view;
                self.set_view(view);
            }
            InboundEvent::RefreshDeliveries { deliveries } => {
                if !apply_deliveries(self.state.snapshot.as_mut(), deliveries) {
                    debug!("Delivery refresh ignored, no shop loaded");
                }
            }
            InboundEvent::Close {} => self.teardown(),
            InboundEvent::Notify {
                message,
                kind,
                duration,
            } => {
                self.notify(
                    &message,
                    kind.unwrap_or_default(),
                    duration.unwrap_or(self.config.notifications.default_duration_ms),
                );
            }
            InboundEvent::Unknown => debug!("Ignoring unknown inbound action"),
        }
    }

    /// Drops all session-scoped state in one step.
    pub fn teardown(&mut self) {
        info!("Session torn down");
        self.state = SessionState::new(&self.config);
    }

    // =========================================================================
    // Access and Navigation
    // =========================================================================

    /// Re-derives ownership flags from the snapshot.
    ///
    /// The owner always may manage; a player who just lost ownership loses
    /// management; an unset `canManage` means false.
    pub fn sync_access_flags(&mut self) {
        let owner = self.state.snapshot.as_ref().and_then(|shop| shop.owner.as_deref());
        let meta = &mut self.state.meta;
        let was_owner = meta.is_owner;
        meta.is_owner = match (meta.citizenid.as_deref(), owner) {
            (Some(citizenid), Some(owner)) => !citizenid.is_empty() && citizenid == owner,
            _ => false,
        };

        if meta.is_owner {
            meta.can_manage = Some(true);
        } else if was_owner {
            meta.can_manage = Some(false);
        } else if meta.can_manage.is_none() {
            meta.can_manage = Some(false);
        }
    }

    /// Switches screens, falling back to the storefront when not allowed.
    pub fn set_view(&mut self, view: SessionView) -> SessionView {
        let allowed = match view {
            SessionView::Shop => true,
            SessionView::Management => self.state.meta.can_manage(),
            SessionView::Admin => self.state.meta.is_admin,
        };
        self.state.view = if allowed { view } else { SessionView::Shop };
        if !allowed {
            debug!(requested = ?view, "View not permitted, showing shop");
        }
        self.state.view
    }

    /// Selects a category. Unknown keys are ignored.
    pub fn select_category(&mut self, key: &str) -> bool {
        let known = self
            .state
            .snapshot
            .as_ref()
            .is_some_and(|shop| shop.inventory.contains_key(key));
        if known {
            self.state.selected_category = Some(key.to_string());
        }
        known
    }

    pub fn set_management_tab(&mut self, tab: ManagementTab) {
        self.state.management_tab = tab;
    }

    fn first_category(&self) -> Option<String> {
        self.state
            .snapshot
            .as_ref()
            .and_then(|shop| shop.first_category_key())
            .map(str::to_string)
    }

    fn ensure_category(&mut self) {
        let still_there = match (&self.state.selected_category, &self.state.snapshot) {
            (Some(key), Some(shop)) => shop.inventory.contains_key(key),
            _ => false,
        };
        if !still_there {
            self.state.selected_category = self.first_category();
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Pushes a notification.
    pub fn notify(&mut self, message: &str, kind: NotificationKind, duration_ms: u64) -> Option<String> {
        self.state.notifications.push(message, kind, duration_ms)
    }

    pub fn dismiss_notification(&mut self, id: &str) -> bool {
        self.state.notifications.remove(id)
    }

    pub fn prune_notifications(&mut self, now: DateTime<Utc>) -> usize {
        self.state.notifications.prune_expired(now)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of an item. At the stock limit the add is a no-op.
    pub fn add_to_cart(&mut self, item_id: ItemId) -> SyncResult<()> {
        let shop = self.state.snapshot.as_ref().ok_or(SyncError::NoShop)?;
        let item = shop.item_by_id(item_id).ok_or(CoreError::ItemNotFound(item_id))?;
        match self.state.cart.add(item, shop.discount) {
            Err(CoreError::InsufficientStock { available, .. }) => {
                debug!(item_id, available, "Cart already holds all stock");
                Ok(())
            }
            result => result.map_err(SyncError::from),
        }
    }

    /// Changes a line's quantity within `[1, stock]`.
    pub fn adjust_cart(&mut self, item_id: ItemId, delta: i64) -> SyncResult<i64> {
        let shop = self.state.snapshot.as_ref().ok_or(SyncError::NoShop)?;
        let stock = shop.item_by_id(item_id).map_or(0, |item| item.quantity);
        Ok(self.state.cart.adjust(item_id, delta, stock.max(1))?)
    }

    pub fn remove_from_cart(&mut self, item_id: ItemId) -> bool {
        self.state.cart.remove(item_id)
    }

    /// Sends the cart as a purchase and empties it.
    pub async fn checkout(&mut self, pay_with: PaymentMethod) -> SyncResult<()> {
        let request = self.state.cart.checkout(pay_with)?;
        self.dispatch(request).await
    }

    // =========================================================================
    // Management
    // =========================================================================

    fn managed_shop(&self) -> SyncResult<&ShopSnapshot> {
        let shop = self.state.snapshot.as_ref().ok_or(SyncError::NoShop)?;
        if !self.state.meta.can_manage() {
            return Err(SyncError::NotPermitted("canManage"));
        }
        Ok(shop)
    }

    fn known_item(&self, item_id: ItemId) -> SyncResult<()> {
        let shop = self.managed_shop()?;
        shop.item_by_id(item_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::ItemNotFound(item_id).into())
    }

    async fn dispatch(&self, request: OutboundRequest) -> SyncResult<()> {
        debug!(action = request.action(), "Dispatching request");
        self.gateway.send(request).await
    }

    pub async fn set_price(&mut self, item_id: ItemId, price: i64) -> SyncResult<()> {
        self.known_item(item_id)?;
        let price = validation::validate_price(price)?;
        self.dispatch(OutboundRequest::SetPrice { item_id, price }).await
    }

    pub async fn set_item_discount(&mut self, item_id: ItemId, discount: i64) -> SyncResult<()> {
        self.known_item(item_id)?;
        let discount = validation::validate_discount(discount, self.config.management.max_discount)?;
        self.dispatch(OutboundRequest::SetItemDiscount { item_id, discount }).await
    }

    pub async fn set_shop_discount(&mut self, discount: i64) -> SyncResult<()> {
        self.managed_shop()?;
        let discount = validation::validate_discount(discount, self.config.management.max_discount)?;
        self.dispatch(OutboundRequest::SetDiscount { discount }).await
    }

    /// Hires at `wage`, or at the configured default wage.
    pub async fn hire_employee(
        &mut self,
        citizenid: &str,
        role: EmployeeRole,
        wage: Option<i64>,
    ) -> SyncResult<()> {
        self.managed_shop()?;
        let citizenid = validation::validate_citizenid(citizenid)?;
        let wage = validation::validate_wage(wage.unwrap_or(self.config.management.default_wage))?;
        self.dispatch(OutboundRequest::HireEmployee {
            citizenid,
            role,
            wage,
        })
        .await
    }

    pub async fn fire_employee(&mut self, citizenid: &str) -> SyncResult<()> {
        self.managed_shop()?;
        let citizenid = validation::validate_citizenid(citizenid)?;
        self.dispatch(OutboundRequest::FireEmployee { citizenid }).await
    }

    pub async fn deposit(&mut self, amount: i64) -> SyncResult<()> {
        self.managed_shop()?;
        let amount = validation::validate_amount(amount)?;
        self.dispatch(OutboundRequest::Deposit { amount }).await
    }

    pub async fn withdraw(&mut self, amount: i64) -> SyncResult<()> {
        self.managed_shop()?;
        let amount = validation::validate_amount(amount)?;
        self.dispatch(OutboundRequest::Withdraw { amount }).await
    }

    pub async fn unlock_vehicle(&mut self, vehicle: &str) -> SyncResult<()> {
        let shop = self.managed_shop()?;
        CapacityPlanner::new(shop).check_unlock(vehicle)?;
        self.dispatch(OutboundRequest::UnlockVehicle {
            vehicle: vehicle.to_string(),
        })
        .await
    }

    pub async fn start_delivery(&mut self, delivery_id: &str, vehicle: Option<&str>) -> SyncResult<()> {
        let shop = self.managed_shop()?;
        CapacityPlanner::new(shop).check_start(delivery_id, vehicle)?;
        self.dispatch(OutboundRequest::StartDelivery {
            delivery_id: delivery_id.to_string(),
            vehicle: vehicle.filter(|key| !key.is_empty()).map(str::to_string),
        })
        .await
    }

    /// Buying is only offered for an unowned shop.
    pub async fn buy_shop(&mut self) -> SyncResult<()> {
        let shop = self.state.snapshot.as_ref().ok_or(SyncError::NoShop)?;
        if !shop.is_unowned() {
            return Err(SyncError::NotPermitted("shop already owned"));
        }
        self.dispatch(OutboundRequest::BuyShop {}).await
    }

    pub async fn sell_shop(&mut self) -> SyncResult<()> {
        self.state.snapshot.as_ref().ok_or(SyncError::NoShop)?;
        if !self.state.meta.is_owner {
            return Err(SyncError::NotPermitted("isOwner"));
        }
        self.dispatch(OutboundRequest::SellShop {}).await
    }

    pub async fn open_management(&mut self) -> SyncResult<()> {
        self.managed_shop()?;
        self.dispatch(OutboundRequest::OpenManagement {}).await
    }

    /// Closes locally, then tells the host.
    pub async fn close(&mut self) -> SyncResult<()> {
        self.teardown();
        self.dispatch(OutboundRequest::Close {}).await
    }

    // =========================================================================
    // Delivery Manifest
    // =========================================================================

    pub fn set_manifest_vehicle(&mut self, vehicle: Option<&str>) {
        self.state.manifest.vehicle = vehicle.filter(|key| !key.is_empty()).map(str::to_string);
    }

    pub fn set_manifest_label(&mut self, label: &str) {
        self.state.manifest.label = label.to_string();
    }

    pub fn add_manifest_row(&mut self) -> usize {
        self.state
            .manifest
            .push_row(self.config.management.default_manifest_quantity);
        self.state.manifest.rows.len() - 1
    }

    pub fn set_manifest_row(&mut self, index: usize, row: ManifestRow) -> SyncResult<()> {
        let slot = self
            .state
            .manifest
            .rows
            .get_mut(index)
            .ok_or(SyncError::IndexOutOfRange { list: "manifest", index })?;
        *slot = row;
        Ok(())
    }

    pub fn remove_manifest_row(&mut self, index: usize) -> SyncResult<()> {
        if index >= self.state.manifest.rows.len() {
            return Err(SyncError::IndexOutOfRange { list: "manifest", index });
        }
        self.state.manifest.rows.remove(index);
        Ok(())
    }

    /// Capacity hint for the form; `None` until a shop and vehicle are set.
    pub fn manifest_capacity(&self) -> Option<CapacityCheck> {
        let shop = self.state.snapshot.as_ref()?;
        let vehicle = self.state.manifest.vehicle.as_deref()?;
        let lines = self.state.manifest.resolve(shop);
        Some(CapacityPlanner::new(shop).validate_lines(&lines, vehicle))
    }

    /// Submits the manifest and starts a fresh form.
    pub async fn create_delivery(&mut self) -> SyncResult<()> {
        let shop = self.managed_shop()?;
        let order = match CapacityPlanner::new(shop).check_submission(&self.state.manifest) {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "Delivery rejected locally");
                return Err(err.into());
            }
        };
        self.dispatch(OutboundRequest::CreateDelivery(order)).await?;
        self.state.manifest = fresh_manifest(&self.config);
        Ok(())
    }

    // =========================================================================
    // Admin
    // =========================================================================

    async fn fetch_coords(&mut self) -> SyncResult<Coords> {
        match self.gateway.player_coords().await {
            Ok(Some(coords)) => Ok(coords),
            Ok(None) => {
                self.report_coords_failure();
                Err(SyncError::Transport("no position in reply".into()))
            }
            Err(err) => {
                self.report_coords_failure();
                Err(err)
            }
        }
    }

    fn report_coords_failure(&mut self) {
        let message = self.config.messages.coords_failed.clone();
        let duration = self.config.notifications.save_failure_ms;
        warn!("Player position unavailable");
        self.notify(&message, NotificationKind::Error, duration);
    }

    /// Starts a new shop at the player's position.
    ///
    /// When the position cannot be read, the new shop starts at the current
    /// draft's position instead.
    pub async fn admin_start_create(&mut self) -> SyncResult<()> {
        if !self.state.meta.is_admin {
            return Err(SyncError::NotPermitted("isAdmin"));
        }
        let coords = match self.gateway.player_coords().await {
            Ok(coords) => coords,
            Err(err) => {
                warn!(error = %err, "Position lookup failed, creating at draft position");
                None
            }
        };
        self.state.admin.start_create(coords);
        Ok(())
    }

    /// Moves part of the draft to the player's position.
    pub async fn admin_capture(&mut self, target: CaptureTarget) -> SyncResult<()> {
        self.state.admin.draft().ok_or(SyncError::NoDraft)?;
        let coords = self.fetch_coords().await?;
        let admin = &mut self.state.admin;
        match target {
            CaptureTarget::Coords => admin.capture_coords(coords),
            CaptureTarget::Zone => admin.capture_zone(coords),
            CaptureTarget::Point(list, index) => admin.capture_point(list, index, coords),
            CaptureTarget::RoutePoint { route, point } => admin.capture_route_point(route, point, coords),
        }
    }

    /// Adds a point to `list` at the player's position.
    pub async fn admin_add_point_here(&mut self, list: PointList) -> SyncResult<usize> {
        self.state.admin.draft().ok_or(SyncError::NoDraft)?;
        let coords = self.fetch_coords().await?;
        self.state.admin.add_point(list, Some(coords))
    }

    /// Adds a route starting at the player's position.
    pub async fn admin_add_route_here(&mut self) -> SyncResult<usize> {
        self.state.admin.draft().ok_or(SyncError::NoDraft)?;
        let coords = self.fetch_coords().await?;
        self.state.admin.add_route(Some(coords))
    }

    /// Adds a vehicle template, reporting a missing or duplicate template
    /// as a notification.
    pub fn admin_add_vehicle_from_template(&mut self, key: &str) -> SyncResult<()> {
        let result = self.state.admin.add_vehicle_from_template(key);
        let notifications = &self.config.notifications;
        let messages = &self.config.messages;
        let toast = match &result {
            Err(SyncError::Validation(CoreError::VehicleNotFound(_))) => Some((
                messages.template_missing.clone(),
                NotificationKind::Error,
                notifications.missing_template_ms,
            )),
            Err(SyncError::Validation(CoreError::Validation(ValidationError::Duplicate { .. }))) => Some((
                messages.vehicle_exists.clone(),
                NotificationKind::Warning,
                notifications.duplicate_vehicle_ms,
            )),
            _ => None,
        };
        if let Some((message, kind, duration)) = toast {
            self.notify(&message, kind, duration);
        }
        result
    }

    /// Validates the draft and takes the payload to submit.
    ///
    /// A local failure is shown as a warning and nothing is sent. The
    /// session stays fully usable until [`admin_finish_save`] is called:
    /// hosts submit `ticket.payload` through their own gateway handle (the
    /// gateways are cheap to clone) and feed the result back.
    ///
    /// [`admin_finish_save`]: ShopSession::admin_finish_save
    pub fn admin_begin_save(&mut self) -> SyncResult<SaveTicket> {
        match self.state.admin.begin_save() {
            Ok(ticket) => Ok(ticket),
            Err(err) => {
                warn!(error = %err, "Save blocked locally");
                let message = err.user_message(&self.config.messages.save_failed);
                let duration = self.config.notifications.save_failure_ms;
                self.notify(&message, NotificationKind::Warning, duration);
                Err(err)
            }
        }
    }

    /// Reconciles a save reply.
    ///
    /// Server rejections and transport failures are shown as an error
    /// notification (the server's message when it sent one); success shows
    /// a confirmation.
    pub fn admin_finish_save(&mut self, outcome: SyncResult<SaveResponse>) -> SyncResult<()> {
        match self.state.admin.finish_save(outcome) {
            Ok(()) => {
                let message = self.config.messages.save_succeeded.clone();
                let duration = self.config.notifications.save_success_ms;
                self.notify(&message, NotificationKind::Success, duration);
                Ok(())
            }
            Err(err) => {
                let message = err.user_message(&self.config.messages.save_failed);
                let duration = self.config.notifications.save_failure_ms;
                self.notify(&message, NotificationKind::Error, duration);
                Err(err)
            }
        }
    }

    /// Begin, submit through the session's gateway, finish.
    ///
    /// Holds the session for the whole round trip. Hosts that must keep
    /// handling pushes and edits meanwhile use [`admin_begin_save`] and
    /// [`admin_finish_save`] instead.
    ///
    /// [`admin_begin_save`]: ShopSession::admin_begin_save
    /// [`admin_finish_save`]: ShopSession::admin_finish_save
    pub async fn admin_save(&mut self) -> SyncResult<()> {
        let ticket = self.admin_begin_save()?;
        let outcome = self.gateway.save_shop(ticket.payload).await;
        self.admin_finish_save(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftState;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeGateway {
        sent: Mutex<Vec<OutboundRequest>>,
        replies: Mutex<VecDeque<SyncResult<Value>>>,
    }

    impl FakeGateway {
        fn reply(self, value: SyncResult<Value>) -> Self {
            self.replies.lock().unwrap().push_back(value);
            self
        }

        fn actions(&self) -> Vec<&'static str> {
            self.sent.lock().unwrap().iter().map(|r| r.action()).collect()
        }

        fn last(&self) -> OutboundRequest {
            self.sent.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ShopGateway for FakeGateway {
        async fn send(&self, request: OutboundRequest) -> SyncResult<()> {
            self.sent.lock().unwrap().push(request);
            Ok(())
        }

        async fn invoke(&self, request: OutboundRequest) -> SyncResult<Value> {
            self.sent.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SyncError::Transport("no reply".into())))
        }
    }

    fn session(gateway: FakeGateway) -> ShopSession<FakeGateway> {
        ShopSession::new(SessionConfig::default(), gateway)
    }

    fn shop(identifier: &str, owner: Option<&str>) -> Value {
        json!({
            "identifier": identifier,
            "label": identifier,
            "owner": owner,
            "level": 2,
            "discount": 10,
            "inventory": {
                "drinks": { "label": "Drinks", "items": [
                    { "id": 1, "item": "water", "label": "Water", "quantity": 2, "basePrice": 10 }
                ]},
                "food": { "label": "Food", "items": [
                    { "id": 2, "item": "bread", "label": "Bread", "quantity": 30, "basePrice": 4 }
                ]}
            },
            "deliveryVehicles": { "speedo": { "capacity": 20 }, "mule": { "capacity": 90, "minLevel": 5 } },
            "vehicleOwnership": { "speedo": { "unlocked": true } },
            "deliveries": [{ "identifier": "d-1", "status": "pending" }],
            "stats": { "labels": ["Mon"], "sales": [3] }
        })
    }

    fn open(session: &mut ShopSession<FakeGateway>, identifier: &str, owner: Option<&str>, citizenid: &str) {
        session
            .handle_frame(json!({
                "action": "openShop",
                "shop": shop(identifier, owner),
                "meta": { "citizenid": citizenid }
            }))
            .unwrap();
    }

    #[test]
    fn test_open_shop_defaults() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", None, "CID1");

        assert!(session.is_visible());
        assert_eq!(session.view(), SessionView::Shop);
        assert_eq!(session.selected_category(), Some("drinks"));
        assert_eq!(session.manifest().rows.len(), 1);
        assert_eq!(session.manifest().rows[0].quantity, 10);
        assert!(!session.meta().can_manage());
    }

    #[test]
    fn test_close_then_open_leaves_no_residue() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", None, "CID1");
        session.add_to_cart(2).unwrap();
        session.notify("hello", NotificationKind::Info, 5000);
        assert!(!session.cart().is_empty());

        session.handle_frame(json!({ "action": "close" })).unwrap();
        assert!(!session.is_visible());
        assert!(session.snapshot().is_none());

        open(&mut session, "harbor", None, "CID1");
        assert!(session.cart().is_empty());
        assert!(session.notifications().is_empty());
        assert_eq!(session.snapshot().unwrap().identifier, "harbor");
    }

    #[test]
    fn test_open_shop_with_empty_tables() {
        let mut session = session(FakeGateway::default());
        session
            .handle_frame(json!({
                "action": "openShop",
                "shop": {
                    "identifier": "kiosk",
                    "heading": "90.0",
                    "inventory": [],
                    "deliveryVehicles": [],
                    "vehicleOwnership": []
                },
                "meta": { "citizenid": "CID1" }
            }))
            .unwrap();

        assert!(session.is_visible());
        let shop = session.snapshot().unwrap();
        assert_eq!(shop.heading, Some(90.0));
        assert!(shop.inventory.is_empty());
        assert_eq!(session.selected_category(), None);
    }

    #[test]
    fn test_open_management_keeps_cart() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("CID1"), "CID1");
        session.add_to_cart(2).unwrap();

        session
            .handle_frame(json!({
                "action": "openManagement",
                "shop": shop("corner", Some("CID1")),
                "meta": { "citizenid": "CID1" }
            }))
            .unwrap();
        assert_eq!(session.view(), SessionView::Management);
        assert_eq!(session.cart().total_quantity(), 1);
    }

    #[test]
    fn test_access_flags_follow_ownership() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("CID1"), "CID1");
        assert!(session.meta().is_owner);
        assert!(session.meta().can_manage());
        assert_eq!(session.set_view(SessionView::Management), SessionView::Management);

        session
            .handle_frame(json!({ "action": "refreshShop", "shop": shop("corner", Some("CID2")) }))
            .unwrap();
        assert!(!session.meta().is_owner);
        assert!(!session.meta().can_manage());
        assert_eq!(session.view(), SessionView::Shop);
        assert_eq!(session.set_view(SessionView::Admin), SessionView::Shop);
    }

    #[test]
    fn test_refresh_carries_stats_and_deliveries_patch() {
        let mut session = session(FakeGateway::default());
        session
            .handle_frame(json!({ "action": "refreshDeliveries", "deliveries": [] }))
            .unwrap();
        assert!(session.snapshot().is_none());

        open(&mut session, "corner", None, "CID1");
        let mut pushed = shop("corner", None);
        pushed.as_object_mut().unwrap().remove("stats");
        session
            .handle_frame(json!({ "action": "refreshShop", "shop": pushed }))
            .unwrap();
        assert_eq!(session.snapshot().unwrap().stats.as_ref().unwrap().labels, ["Mon"]);

        session
            .handle_frame(json!({ "action": "refreshDeliveries", "deliveries": null }))
            .unwrap();
        assert!(session.snapshot().unwrap().deliveries.is_empty());
    }

    #[test]
    fn test_notify_event_defaults() {
        let mut session = session(FakeGateway::default());
        session
            .handle_frame(json!({ "action": "notify", "message": "Heads up" }))
            .unwrap();
        let note = session.notifications().last().unwrap();
        assert_eq!(note.kind, NotificationKind::Info);
        assert_eq!(note.message, "Heads up");
    }

    #[test]
    fn test_cart_stops_at_stock() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", None, "CID1");
        for _ in 0..5 {
            session.add_to_cart(1).unwrap();
        }
        assert_eq!(session.cart().total_quantity(), 2);
        assert_eq!(session.cart().lines()[0].price.units(), 9);
        assert_eq!(session.adjust_cart(1, 5).unwrap(), 2);
        assert!(session.add_to_cart(99).is_err());
    }

    #[tokio::test]
    async fn test_checkout_sends_purchase() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", None, "CID1");
        assert!(session.checkout(PaymentMethod::Cash).await.unwrap_err().is_validation());

        session.add_to_cart(2).unwrap();
        session.checkout(PaymentMethod::Bank).await.unwrap();
        assert!(session.cart().is_empty());
        assert_eq!(session.gateway().actions(), ["purchase"]);
    }

    #[tokio::test]
    async fn test_management_requires_permission() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("OTHER"), "CID1");
        assert!(matches!(
            session.deposit(100).await,
            Err(SyncError::NotPermitted("canManage"))
        ));
        assert!(session.gateway().actions().is_empty());
    }

    #[tokio::test]
    async fn test_management_validation() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("CID1"), "CID1");

        assert!(session.deposit(0).await.unwrap_err().is_validation());
        assert!(session.set_price(1, -5).await.unwrap_err().is_validation());
        assert!(session.set_shop_discount(80).await.unwrap_err().is_validation());
        assert!(session.hire_employee("  ", EmployeeRole::Cashier, None).await.is_err());
        assert!(session.gateway().actions().is_empty());

        session.set_price(1, 12).await.unwrap();
        session.hire_employee("CID9", EmployeeRole::Driver, None).await.unwrap();
        let frame = session.gateway().last().to_frame().unwrap();
        assert_eq!(frame["data"]["wage"], 250);
        assert_eq!(frame["data"]["role"], "driver");
        assert_eq!(session.gateway().actions(), ["setPrice", "hireEmployee"]);
    }

    #[tokio::test]
    async fn test_vehicle_and_delivery_rules() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("CID1"), "CID1");

        assert!(session.unlock_vehicle("speedo").await.is_err());
        assert!(session.unlock_vehicle("mule").await.is_err());
        assert!(session.start_delivery("d-1", Some("mule")).await.is_err());
        session.start_delivery("d-1", None).await.unwrap();
        assert_eq!(
            session.gateway().last().to_frame().unwrap(),
            json!({ "action": "startDelivery", "data": { "deliveryId": "d-1", "vehicle": null } })
        );
    }

    #[tokio::test]
    async fn test_create_delivery_checks_capacity() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("CID1"), "CID1");

        session.set_manifest_vehicle(Some("speedo"));
        session
            .set_manifest_row(0, ManifestRow { item_id: Some(2), quantity: 25 })
            .unwrap();
        let check = session.manifest_capacity().unwrap();
        assert_eq!((check.total, check.capacity, check.over_capacity), (25, 20, true));
        assert!(session.create_delivery().await.is_err());

        session
            .set_manifest_row(0, ManifestRow { item_id: Some(2), quantity: 15 })
            .unwrap();
        session.set_manifest_label("Morning run");
        session.create_delivery().await.unwrap();
        assert_eq!(session.gateway().actions(), ["createDelivery"]);
        assert_eq!(session.manifest().label, "");
        assert!(session.remove_manifest_row(3).is_err());
    }

    #[tokio::test]
    async fn test_buy_and_sell_gates() {
        let mut session = session(FakeGateway::default());
        open(&mut session, "corner", Some("CID2"), "CID1");
        assert!(session.buy_shop().await.is_err());
        assert!(session.sell_shop().await.is_err());

        open(&mut session, "corner", None, "CID1");
        session.buy_shop().await.unwrap();
        assert_eq!(session.gateway().actions(), ["buyShop"]);
    }

    fn admin_overview() -> Value {
        json!({
            "action": "openAdminOverview",
            "shops": [{ "identifier": "corner", "label": "Corner", "type": "general" }],
            "shopTypes": { "general": { "label": "General", "purchasePrice": 100 } },
            "vehicleTemplates": { "speedo": { "capacity": 50 } }
        })
    }

    #[tokio::test]
    async fn test_admin_create_and_save() {
        let gateway = FakeGateway::default()
            .reply(Ok(json!({ "coords": { "x": 1, "y": 2, "z": 3, "heading": 4 } })))
            .reply(Ok(json!({
                "success": true,
                "payload": {
                    "shops": [
                        { "identifier": "corner", "label": "Corner", "type": "general" },
                        { "identifier": "test_shop", "label": "Test Shop", "type": "general" }
                    ],
                    "shopTypes": { "general": { "label": "General" } }
                }
            })));
        let mut session = session(gateway);
        session.handle_frame(admin_overview()).unwrap();
        assert_eq!(session.view(), SessionView::Admin);
        assert!(session.meta().is_admin);

        session.admin_start_create().await.unwrap();
        assert_eq!(session.admin().draft().unwrap().coords, Coords::new(1.0, 2.0, 3.0, 4.0));

        session.admin_mut().set_field("identifier", &json!("Test Shop")).unwrap();
        session.admin_mut().set_field("label", &json!("Test Shop")).unwrap();
        session.admin_save().await.unwrap();

        assert_eq!(session.admin().state(), DraftState::EditingExisting);
        assert_eq!(session.admin().selected(), Some("test_shop"));
        assert_eq!(session.notifications().last().unwrap().kind, NotificationKind::Success);
        assert_eq!(
            session.gateway().actions(),
            ["adminGetPlayerCoords", "adminSaveShop"]
        );
    }

    #[tokio::test]
    async fn test_admin_save_rejection_shows_server_message() {
        let gateway = FakeGateway::default()
            .reply(Ok(json!({ "success": false, "message": "Identifier reserved" })));
        let mut session = session(gateway);
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();
        session.admin_mut().set_field("label", &json!("Renamed")).unwrap();

        let err = session.admin_save().await.unwrap_err();
        assert!(matches!(err, SyncError::CommitRejected { .. }));
        assert!(session.admin().is_dirty());
        let note = session.notifications().last().unwrap();
        assert_eq!(note.message, "Identifier reserved");
        assert_eq!(note.kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_admin_save_transport_failure_is_generic() {
        let mut session = session(FakeGateway::default());
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();
        session.admin_mut().set_field("label", &json!("Renamed")).unwrap();

        assert!(session.admin_save().await.is_err());
        assert_eq!(session.notifications().last().unwrap().message, "Failed to save shop");
    }

    #[tokio::test]
    async fn test_admin_save_blocked_locally() {
        let mut session = session(FakeGateway::default());
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();

        assert!(matches!(session.admin_save().await, Err(SyncError::NothingToSave)));
        assert!(session.gateway().actions().is_empty());
    }

    #[tokio::test]
    async fn test_taken_identifier_blocks_save_with_warning() {
        let mut session = session(FakeGateway::default());
        session.handle_frame(admin_overview()).unwrap();
        session.admin_start_create().await.unwrap();
        session.admin_mut().set_field("identifier", &json!("Corner")).unwrap();
        session.admin_mut().set_field("label", &json!("Second Corner")).unwrap();

        assert!(!session.admin().can_save());
        assert!(session.admin_save().await.unwrap_err().is_validation());
        let note = session.notifications().last().unwrap();
        assert_eq!(note.kind, NotificationKind::Warning);
        assert_eq!(note.message, "Validation error: identifier 'corner' already exists");
        assert_eq!(session.gateway().actions(), ["adminGetPlayerCoords"]);
    }

    #[tokio::test]
    async fn test_session_stays_usable_while_save_in_flight() {
        let gateway = Arc::new(FakeGateway::default().reply(Ok(json!({
            "success": true,
            "payload": {
                "shops": [{ "identifier": "corner", "label": "Corner Saved", "type": "general" }],
                "shopTypes": { "general": { "label": "General" } }
            }
        }))));
        let mut session = ShopSession::new(SessionConfig::default(), Arc::clone(&gateway));
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();
        session.admin_mut().set_field("label", &json!("Submitted")).unwrap();

        let ticket = session.admin_begin_save().unwrap();
        session.admin_mut().set_field("label", &json!("Typed while saving")).unwrap();
        session
            .handle_frame(json!({ "action": "refreshShop", "shop": shop("corner", None) }))
            .unwrap();
        session
            .handle_frame(json!({ "action": "notify", "message": "Stock arrived" }))
            .unwrap();
        assert_eq!(ticket.payload.label, "Submitted");
        assert!(session.admin().is_dirty());

        let outcome = gateway.save_shop(ticket.payload).await;
        session.admin_finish_save(outcome).unwrap();

        assert_eq!(session.admin().selected(), Some("corner"));
        assert_eq!(session.admin().draft().unwrap().label, "Corner Saved");
        assert!(!session.admin().is_dirty());
        let messages: Vec<&str> = session
            .notifications()
            .entries()
            .iter()
            .map(|note| note.message.as_str())
            .collect();
        assert_eq!(messages, ["Stock arrived", "Shop saved"]);
        assert_eq!(gateway.actions(), ["adminSaveShop"]);
    }

    #[tokio::test]
    async fn test_capture_failure_notifies() {
        let mut session = session(FakeGateway::default().reply(Ok(Value::Null)));
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();

        assert!(session.admin_capture(CaptureTarget::Coords).await.is_err());
        assert!(!session.admin().is_dirty());
        assert_eq!(
            session.notifications().last().unwrap().message,
            "Could not read player position"
        );
    }

    #[tokio::test]
    async fn test_capture_point() {
        let gateway = FakeGateway::default().reply(Ok(json!({ "x": 7, "y": 8, "z": 9, "w": 180 })));
        let mut session = session(gateway);
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();

        let index = session.admin_add_point_here(PointList::VehicleSpawns).await.unwrap();
        let spawn = &session.admin().draft().unwrap().vehicle_spawns[index];
        assert_eq!((spawn.x, spawn.heading), (7.0, Some(180.0)));
        assert!(session.admin().is_dirty());
    }

    #[test]
    fn test_template_notifications() {
        let mut session = session(FakeGateway::default());
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();

        assert!(session.admin_add_vehicle_from_template("blimp").is_err());
        assert_eq!(session.notifications().last().unwrap().kind, NotificationKind::Error);

        session.admin_add_vehicle_from_template("speedo").unwrap();
        assert!(session.admin_add_vehicle_from_template("speedo").is_err());
        let note = session.notifications().last().unwrap();
        assert_eq!(note.kind, NotificationKind::Warning);
        assert_eq!(note.message, "Vehicle already added");
        assert_eq!(session.admin().draft().unwrap().vehicles.len(), 1);
    }

    #[tokio::test]
    async fn test_close_tears_down_admin_state() {
        let mut session = session(FakeGateway::default());
        session.handle_frame(admin_overview()).unwrap();
        session.admin_mut().select_shop("corner").unwrap();

        session.close().await.unwrap();
        assert_eq!(session.admin().state(), DraftState::NoDraft);
        assert!(!session.meta().is_admin);
        assert_eq!(session.gateway().actions(), ["close"]);
    }
}

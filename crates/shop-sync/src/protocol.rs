//! # Wire Protocol
//!
//! Frames exchanged with the host bridge.
//!
//! ## Frame Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Message Flow                                   │
//! │                                                                         │
//! │  HOST ──► SESSION  (flat, tagged by "action")                           │
//! │  ─────────────────────────────────────────                              │
//! │  { "action": "openShop", "shop": {...}, "meta": {...} }                 │
//! │  { "action": "openAdminOverview", "shops": [...], "shopTypes": {...} }  │
//! │  { "action": "refreshDeliveries", "deliveries": [...] }                 │
//! │  { "action": "notify", "message": "...", "type": "error" }              │
//! │                                                                         │
//! │  SESSION ──► HOST  (adjacently tagged)                                  │
//! │  ─────────────────────────────────────                                  │
//! │  { "action": "purchase", "data": { "cart": [...], "payWith": "cash" } } │
//! │  { "action": "adminSaveShop", "data": { ...draft... } }                 │
//! │                                                                         │
//! │  Only adminSaveShop and adminGetPlayerCoords expect a reply.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_core::capacity::DeliveryOrder;
use shop_core::coerce::{self, de};
use shop_core::{
    Capabilities, Delivery, EmployeeRole, ItemId, Money, ShopSnapshot, ShopTypeConfig,
    VehicleTemplates,
};

use crate::cart::{CartLine, PaymentMethod};
use crate::draft::{Coords, ShopDraft};
use crate::error::{SyncError, SyncResult};
use crate::notify::NotificationKind;

// =============================================================================
// Inbound Events
// =============================================================================

/// An authoritative push from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Open the storefront.
    OpenShop {
        shop: ShopSnapshot,
        #[serde(default, deserialize_with = "de::null_as_default")]
        meta: Capabilities,
    },

    /// Open the management panel.
    OpenManagement {
        shop: ShopSnapshot,
        #[serde(default, deserialize_with = "de::null_as_default")]
        meta: Capabilities,
    },

    /// Open the admin console with the full catalog.
    OpenAdminOverview(AdminOverview),

    /// Replace the snapshot while keeping the session.
    RefreshShop { shop: ShopSnapshot },

    /// Replace only the delivery list.
    RefreshDeliveries {
        #[serde(default, deserialize_with = "de::null_as_default")]
        deliveries: Vec<Delivery>,
    },

    /// Tear the session down.
    Close {},

    /// Show a toast.
    Notify {
        #[serde(default)]
        message: String,
        #[serde(rename = "type", default)]
        kind: Option<NotificationKind>,
        #[serde(default, deserialize_with = "de::opt_millis")]
        duration: Option<u64>,
    },

    /// Any action this session does not handle.
    #[serde(other)]
    Unknown,
}

impl InboundEvent {
    /// Parses a raw frame.
    pub fn from_frame(frame: Value) -> SyncResult<Self> {
        Ok(serde_json::from_value(frame)?)
    }

    /// The action name, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            InboundEvent::OpenShop { .. } => "openShop",
            InboundEvent::OpenManagement { .. } => "openManagement",
            InboundEvent::OpenAdminOverview(_) => "openAdminOverview",
            InboundEvent::RefreshShop { .. } => "refreshShop",
            InboundEvent::RefreshDeliveries { .. } => "refreshDeliveries",
            InboundEvent::Close {} => "close",
            InboundEvent::Notify { .. } => "notify",
            InboundEvent::Unknown => "unknown",
        }
    }
}

/// The admin catalog, as pushed by `openAdminOverview` and returned by a
/// successful save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub shops: Vec<ShopSnapshot>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub shop_types: BTreeMap<String, ShopTypeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_templates: Option<VehicleTemplates>,
    /// Older servers send the template table under this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_vehicles: Option<VehicleTemplates>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub depots: Vec<Value>,
}

impl AdminOverview {
    /// The vehicle template table; `vehicleTemplates` wins when both are sent.
    pub fn templates(&self) -> VehicleTemplates {
        self.vehicle_templates
            .clone()
            .or_else(|| self.delivery_vehicles.clone())
            .unwrap_or_default()
    }
}

// =============================================================================
// Outbound Requests
// =============================================================================

/// A request the session sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum OutboundRequest {
    #[serde(rename_all = "camelCase")]
    Purchase {
        cart: Vec<CartLine>,
        pay_with: PaymentMethod,
    },

    #[serde(rename_all = "camelCase")]
    SetPrice { item_id: ItemId, price: Money },

    #[serde(rename_all = "camelCase")]
    SetItemDiscount { item_id: ItemId, discount: i64 },

    SetDiscount { discount: i64 },

    HireEmployee {
        citizenid: String,
        role: EmployeeRole,
        wage: Money,
    },

    FireEmployee { citizenid: String },

    CreateDelivery(DeliveryOrder),

    #[serde(rename_all = "camelCase")]
    StartDelivery {
        delivery_id: String,
        vehicle: Option<String>,
    },

    UnlockVehicle { vehicle: String },

    Deposit { amount: Money },

    Withdraw { amount: Money },

    OpenManagement {},

    BuyShop {},

    SellShop {},

    Close {},

    AdminSaveShop(ShopDraft),

    AdminGetPlayerCoords {},
}

impl OutboundRequest {
    /// The action name, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            OutboundRequest::Purchase { .. } => "purchase",
            OutboundRequest::SetPrice { .. } => "setPrice",
            OutboundRequest::SetItemDiscount { .. } => "setItemDiscount",
            OutboundRequest::SetDiscount { .. } => "setDiscount",
            OutboundRequest::HireEmployee { .. } => "hireEmployee",
            OutboundRequest::FireEmployee { .. } => "fireEmployee",
            OutboundRequest::CreateDelivery(_) => "createDelivery",
            OutboundRequest::StartDelivery { .. } => "startDelivery",
            OutboundRequest::UnlockVehicle { .. } => "unlockVehicle",
            OutboundRequest::Deposit { .. } => "deposit",
            OutboundRequest::Withdraw { .. } => "withdraw",
            OutboundRequest::OpenManagement {} => "openManagement",
            OutboundRequest::BuyShop {} => "buyShop",
            OutboundRequest::SellShop {} => "sellShop",
            OutboundRequest::Close {} => "close",
            OutboundRequest::AdminSaveShop(_) => "adminSaveShop",
            OutboundRequest::AdminGetPlayerCoords {} => "adminGetPlayerCoords",
        }
    }

    /// True for the request/response actions.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            OutboundRequest::AdminSaveShop(_) | OutboundRequest::AdminGetPlayerCoords {}
        )
    }

    /// Encodes the request as a JSON frame.
    pub fn to_frame(&self) -> SyncResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

// =============================================================================
// Replies
// =============================================================================

/// Reply to `adminSaveShop`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveResponse {
    #[serde(default, deserialize_with = "de::truthy")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub payload: Option<AdminOverview>,
}

impl SaveResponse {
    /// Parses a save reply. A missing or malformed reply is a transport
    /// failure; `success: false` is a rejection.
    pub fn from_reply(reply: Value) -> SyncResult<Self> {
        if !reply.is_object() {
            return Err(SyncError::Transport("empty save reply".into()));
        }
        let response: SaveResponse = serde_json::from_value(reply)
            .map_err(|e| SyncError::Transport(format!("malformed save reply: {}", e)))?;
        if response.success {
            Ok(response)
        } else {
            Err(SyncError::CommitRejected {
                message: response.message,
            })
        }
    }
}

/// Reads the coordinates from an `adminGetPlayerCoords` reply.
///
/// The position may sit under `coords` or at the top level. `None` when
/// the reply carries no object.
pub fn coords_from_reply(reply: &Value) -> Option<Coords> {
    let obj = reply.as_object()?;
    let position = coerce::object(obj, "coords").unwrap_or(obj);
    Some(Coords::from_object(position))
}

//! # shop-sync: Session Engine for the Shop Client
//!
//! Keeps a local view of a remotely owned shop consistent with the
//! authoritative pushes it receives, and drives the admin draft editor
//! through edit, save and reconciliation.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Engine Architecture                      │
//! │                                                                         │
//! │   host push frames                         host request channel         │
//! │        │                                           ▲                    │
//! │        ▼                                           │                    │
//! │  ┌──────────────┐    ┌──────────────────────────────────────────────┐  │
//! │  │ InboundEvent │───►│               ShopSession                    │  │
//! │  │  (protocol)  │    │                                              │  │
//! │  └──────────────┘    │  SessionState ─┬─ snapshot (merge)           │  │
//! │                      │                ├─ cart                       │  │
//! │                      │                ├─ manifest (CapacityPlanner) │  │
//! │                      │                ├─ notifications              │  │
//! │                      │                └─ admin (DraftReconciler)    │  │
//! │                      └──────────────────────┬───────────────────────┘  │
//! │                                             │ OutboundRequest           │
//! │                                             ▼                           │
//! │                      ┌──────────────────────────────────────────────┐  │
//! │                      │   ShopGateway (trait)                        │  │
//! │                      │     └─ ChannelGateway: mpsc + oneshot reply  │  │
//! │                      └──────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - `ShopSession`, the event handler and action surface
//! - [`merge`] - Snapshot merge with statistics carry-over
//! - [`cart`] - Customer cart
//! - [`notify`] - Transient notifications
//! - [`draft`] - Admin draft normalization, editing and save flow
//! - [`protocol`] - Inbound events and outbound requests
//! - [`gateway`] - The authoritative boundary trait
//! - [`transport`] - Channel-backed gateway
//! - [`config`] - Session configuration (`shop.toml` + env)
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Session error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_sync::{ChannelGateway, SessionConfig, ShopSession};
//!
//! shop_sync::telemetry::init_tracing();
//! let config = SessionConfig::load_or_default(None);
//! let (gateway, mut requests) = ChannelGateway::new(config.transport.channel_capacity);
//! let mut session = ShopSession::new(config, gateway);
//!
//! // Host pushes
//! session.handle_frame(frame)?;
//!
//! // User actions
//! session.add_to_cart(item_id)?;
//! session.checkout(PaymentMethod::Cash).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod config;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod merge;
pub mod notify;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, CartLine, PaymentMethod};
pub use config::SessionConfig;
pub use draft::{
    AdminCatalog, AdminView, Coords, DraftReconciler, DraftState, GroupField, PointList,
    SaveTicket, ShopDraft,
};
pub use error::{SyncError, SyncResult};
pub use gateway::ShopGateway;
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use protocol::{AdminOverview, InboundEvent, OutboundRequest, SaveResponse};
pub use session::{CaptureTarget, ManagementTab, SessionState, SessionView, ShopSession};
pub use transport::{ChannelGateway, Envelope};

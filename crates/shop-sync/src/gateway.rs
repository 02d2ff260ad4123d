//! # Shop Gateway
//!
//! The seam between the session and whatever carries requests to the
//! authoritative store. The session never talks to a transport directly.
//!
//! ```text
//!  ShopSession ──► ShopGateway::send ─────────► fire-and-forget actions
//!              └─► ShopGateway::invoke ──reply─► adminSaveShop
//!                                              adminGetPlayerCoords
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::draft::{Coords, ShopDraft};
use crate::error::SyncResult;
use crate::protocol::{self, OutboundRequest, SaveResponse};

/// Outbound boundary of a shop session.
#[async_trait]
pub trait ShopGateway: Send + Sync {
    /// Sends a request that expects no reply.
    async fn send(&self, request: OutboundRequest) -> SyncResult<()>;

    /// Sends a request and waits for the raw reply.
    async fn invoke(&self, request: OutboundRequest) -> SyncResult<Value>;

    /// Submits a draft and classifies the reply.
    async fn save_shop(&self, draft: ShopDraft) -> SyncResult<SaveResponse> {
        let reply = self.invoke(OutboundRequest::AdminSaveShop(draft)).await?;
        SaveResponse::from_reply(reply)
    }

    /// Asks the host for the player's current position.
    async fn player_coords(&self) -> SyncResult<Option<Coords>> {
        let reply = self.invoke(OutboundRequest::AdminGetPlayerCoords {}).await?;
        Ok(protocol::coords_from_reply(&reply))
    }
}

/// Shared handles, so a host can keep one while the session owns another.
#[async_trait]
impl<T: ShopGateway + ?Sized> ShopGateway for std::sync::Arc<T> {
    async fn send(&self, request: OutboundRequest) -> SyncResult<()> {
        (**self).send(request).await
    }

    async fn invoke(&self, request: OutboundRequest) -> SyncResult<Value> {
        (**self).invoke(request).await
    }
}

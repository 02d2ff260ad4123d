//! # Channel Transport
//!
//! A [`ShopGateway`] backed by a tokio channel. The host side drains
//! [`Envelope`]s from the receiver, forwards each frame to the real bridge
//! and answers the ones that expect a reply.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Channel Gateway                                      │
//! │                                                                         │
//! │  send(request)                                                          │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Envelope { id, request, reply: None } ──► mpsc ──► host                │
//! │                                                                         │
//! │  invoke(request)                                                        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Envelope { id, request, reply: Some(tx) } ──► mpsc ──► host            │
//! │     │                                                  │                │
//! │     │  awaits rx  ◄──────── envelope.respond(value) ◄──┘                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  dropped envelope ─► Transport("no reply")                              │
//! │  closed receiver  ─► Transport("channel closed")                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SyncResult;
use crate::gateway::ShopGateway;
use crate::protocol::OutboundRequest;

// =============================================================================
// Envelope
// =============================================================================

/// One request in flight to the host.
#[derive(Debug)]
pub struct Envelope {
    pub id: Uuid,
    pub request: OutboundRequest,
    reply: Option<oneshot::Sender<Value>>,
}

impl Envelope {
    /// Whether the sender is waiting on [`Envelope::respond`].
    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Encodes the request as `{ "action", "data" }`.
    pub fn frame(&self) -> SyncResult<Value> {
        self.request.to_frame()
    }

    /// Answers the request. Returns false when nobody is waiting anymore.
    pub fn respond(self, value: Value) -> bool {
        match self.reply {
            Some(tx) => tx.send(value).is_ok(),
            None => {
                warn!(id = %self.id, action = self.request.action(), "Reply to a one-way request");
                false
            }
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway that hands every request to a channel.
#[derive(Debug, Clone)]
pub struct ChannelGateway {
    tx: mpsc::Sender<Envelope>,
}

impl ChannelGateway {
    /// Creates the gateway and the receiver the host drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChannelGateway { tx }, rx)
    }
}

#[async_trait]
impl ShopGateway for ChannelGateway {
    async fn send(&self, request: OutboundRequest) -> SyncResult<()> {
        let envelope = Envelope {
            id: Uuid::new_v4(),
            request,
            reply: None,
        };
        debug!(id = %envelope.id, action = envelope.request.action(), "Sending request");
        self.tx.send(envelope).await?;
        Ok(())
    }

    async fn invoke(&self, request: OutboundRequest) -> SyncResult<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            id: Uuid::new_v4(),
            request,
            reply: Some(reply_tx),
        };
        let id = envelope.id;
        debug!(id = %id, action = envelope.request.action(), "Invoking request");
        self.tx.send(envelope).await?;

        let reply = reply_rx.await?;
        debug!(id = %id, "Reply received");
        Ok(reply)
    }
}

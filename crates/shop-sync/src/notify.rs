//! # Notification Center
//!
//! Transient toasts. Notifications are session-scoped and never persisted;
//! teardown drops all of them.
//!
//! ## Lifetime
//! ```text
//! push("Saved", Success, 800)
//!      │
//!      ▼
//! id       = "notif-<unix millis>-<seq>"     seq is per session, never reused
//! lifetime = max(800, min_lifetime) = 1500 ms
//! expires  = now + lifetime
//!      │
//!      ▼
//! prune_expired(now) drops it once now ≥ expires
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    /// Also the fallback for kinds this client does not know.
    #[default]
    #[serde(other)]
    Info,
}

/// One visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub expires_at: DateTime<Utc>,
}

/// Ordered list of live notifications.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    entries: Vec<Notification>,
    seq: u64,
    min_lifetime_ms: u64,
}

impl NotificationCenter {
    pub fn new(min_lifetime_ms: u64) -> Self {
        NotificationCenter {
            entries: Vec::new(),
            seq: 0,
            min_lifetime_ms,
        }
    }

    /// Pushes a notification timestamped now.
    pub fn push(&mut self, message: &str, kind: NotificationKind, duration_ms: u64) -> Option<String> {
        self.push_at(message, kind, duration_ms, Utc::now())
    }

    /// Pushes a notification; an empty message adds nothing.
    pub fn push_at(
        &mut self,
        message: &str,
        kind: NotificationKind,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if message.is_empty() {
            return None;
        }
        let lifetime = duration_ms.max(self.min_lifetime_ms);
        let id = format!("notif-{}-{}", now.timestamp_millis(), self.seq);
        self.seq += 1;

        debug!(id = %id, ?kind, lifetime_ms = lifetime, "Notification pushed");
        self.entries.push(Notification {
            id: id.clone(),
            message: message.to_string(),
            kind,
            expires_at: now + Duration::milliseconds(i64::try_from(lifetime).unwrap_or(i64::MAX)),
        });
        Some(id)
    }

    /// Removes one notification; unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Drops every notification whose expiry has passed. Returns how many.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent notification, if any.
    pub fn last(&self) -> Option<&Notification> {
        self.entries.last()
    }
}

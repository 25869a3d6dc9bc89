//! Connected-client registry.
//!
//! Tracks which devices are connected and what they report watching.
//! Records that have not been seen within the staleness window count as
//! absent: reads never return them, and every [`ClientRegistry::list`]
//! purges them.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default staleness window.
pub const STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// A client device known to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedClient {
    pub client_id: String,
    pub device_name: String,
    pub ip_address: String,
    pub last_seen: DateTime<Utc>,
    pub watching: Option<String>,
    pub position_ms: Option<u64>,
}

/// Thread-safe registry of connected clients.
#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<DashMap<String, ConnectedClient>>,
    clock: Arc<dyn Clock>,
    stale_after: chrono::Duration,
}

impl ClientRegistry {
    pub fn new(stale_after: Duration) -> Self {
        Self::with_clock(Arc::new(SystemClock), stale_after)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, stale_after: Duration) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            clock,
            stale_after: chrono::Duration::from_std(stale_after)
                .unwrap_or_else(|_| chrono::Duration::seconds(STALE_AFTER.as_secs() as i64)),
        }
    }

    fn is_stale(&self, client: &ConnectedClient, now: DateTime<Utc>) -> bool {
        now - client.last_seen > self.stale_after
    }

    /// Insert or refresh a client. Watch fields survive re-registration
    /// unless the old record had already expired.
    pub fn register(&self, client_id: &str, device_name: &str, ip_address: &str) -> ConnectedClient {
        let now = self.clock.now();

        let record = match self.clients.entry(client_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let stale = self.is_stale(entry.get(), now);
                let client = entry.get_mut();
                if stale {
                    client.watching = None;
                    client.position_ms = None;
                }
                client.device_name = device_name.to_string();
                client.ip_address = ip_address.to_string();
                client.last_seen = now;
                client.clone()
            }
            Entry::Vacant(entry) => entry
                .insert(ConnectedClient {
                    client_id: client_id.to_string(),
                    device_name: device_name.to_string(),
                    ip_address: ip_address.to_string(),
                    last_seen: now,
                    watching: None,
                    position_ms: None,
                })
                .clone(),
        };

        tracing::info!(
            client_id = %client_id,
            device = %device_name,
            ip = %ip_address,
            "Client registered"
        );
        record
    }

    /// Refresh `last_seen` for `f` on a live record. Unknown or expired ids
    /// are a no-op and return `false`; an expired record is purged.
    fn touch(&self, client_id: &str, f: impl FnOnce(&mut ConnectedClient)) -> bool {
        let now = self.clock.now();
        match self.clients.entry(client_id.to_string()) {
            Entry::Occupied(entry) if self.is_stale(entry.get(), now) => {
                entry.remove();
                tracing::debug!(client_id = %client_id, "Expired client purged on touch");
                false
            }
            Entry::Occupied(mut entry) => {
                let client = entry.get_mut();
                client.last_seen = now;
                f(client);
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Returns whether the client was known.
    pub fn heartbeat(&self, client_id: &str) -> bool {
        let known = self.touch(client_id, |_| {});
        if known {
            tracing::trace!(client_id = %client_id, "Client heartbeat");
        } else {
            tracing::debug!(client_id = %client_id, "Heartbeat from unregistered client");
        }
        known
    }

    /// Record what a client is watching. Returns whether the client was known.
    pub fn report_watching(
        &self,
        client_id: &str,
        title: Option<String>,
        position_ms: Option<u64>,
    ) -> bool {
        self.touch(client_id, |client| {
            client.watching = title;
            client.position_ms = position_ms;
        })
    }

    /// Explicit deregistration. Returns whether a record was removed.
    pub fn remove(&self, client_id: &str) -> bool {
        let removed = self.clients.remove(client_id).is_some();
        if removed {
            tracing::info!(client_id = %client_id, "Client removed");
        }
        removed
    }

    pub fn get(&self, client_id: &str) -> Option<ConnectedClient> {
        let now = self.clock.now();
        self.clients
            .get(client_id)
            .filter(|c| !self.is_stale(c, now))
            .map(|c| c.value().clone())
    }

    /// Live clients sorted by id. Expired records are purged first.
    pub fn list(&self) -> Vec<ConnectedClient> {
        let now = self.clock.now();

        let mut expired = 0usize;
        self.clients.retain(|client_id, client| {
            if self.is_stale(client, now) {
                tracing::info!(
                    client_id = %client_id,
                    inactive_secs = (now - client.last_seen).num_seconds(),
                    "Expired client removed"
                );
                expired += 1;
                false
            } else {
                true
            }
        });
        if expired > 0 {
            tracing::debug!(removed = expired, "Cleaned up expired clients");
        }

        let mut clients: Vec<ConnectedClient> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        clients.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        clients
    }

    /// Physical record count, including expired records not yet purged.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(STALE_AFTER)
    }
}

//! Per-user pending order state.
//!
//! Holds the fields a button click records (originating message timestamp,
//! channel) until the matching dialog submission is confirmed. One entry per
//! user, last write wins. All reads and writes go through a single lock and
//! no lock is held across I/O.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

pub const FIELD_MESSAGE_TS: &str = "message_ts";
pub const FIELD_CHANNEL_ID: &str = "channel_id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingOrder {
    fields: HashMap<String, String>,
    touched_at: Instant,
}

impl PendingOrder {
    fn new(now: Instant) -> Self {
        Self { fields: HashMap::new(), touched_at: now }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn message_ts(&self) -> Option<&str> {
        self.get(FIELD_MESSAGE_TS)
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.get(FIELD_CHANNEL_ID)
    }

    pub fn touched_at(&self) -> Instant {
        self.touched_at
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderStore {
    entries: Arc<Mutex<HashMap<String, PendingOrder>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &str, field: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries.get(user_id).and_then(|order| order.get(field)).map(str::to_owned)
    }

    pub async fn set(&self, user_id: &str, field: &str, value: &str) {
        self.update(user_id, |order| order.set(field, value)).await;
    }

    /// Applies `apply` to the user's entry, creating it first if absent.
    /// The whole read-modify-write happens under one lock hold.
    pub async fn update<F, R>(&self, user_id: &str, apply: F) -> R
    where
        F: FnOnce(&mut PendingOrder) -> R,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let order =
            entries.entry(user_id.to_owned()).or_insert_with(|| PendingOrder::new(now));
        order.touched_at = now;
        apply(order)
    }

    pub async fn snapshot(&self, user_id: &str) -> Option<PendingOrder> {
        self.entries.lock().await.get(user_id).cloned()
    }

    /// Removes the entry only when `matches` accepts it, so a newer order
    /// written by a later click survives.
    pub async fn remove_if<F>(&self, user_id: &str, matches: F) -> Option<PendingOrder>
    where
        F: FnOnce(&PendingOrder) -> bool,
    {
        let mut entries = self.entries.lock().await;
        if entries.get(user_id).is_some_and(matches) {
            entries.remove(user_id)
        } else {
            None
        }
    }

    /// Drops entries not touched within `ttl`; returns how many were dropped.
    pub async fn evict_older_than(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, order| now.saturating_duration_since(order.touched_at) <= ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

pub fn spawn_eviction(store: OrderStore, ttl: Duration, every: Duration) -> JoinHandle<()> {
    info!(
        event_name = "system.orders.eviction_started",
        ttl_secs = ttl.as_secs(),
        interval_secs = every.as_secs(),
        "pending order eviction sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = store.evict_older_than(ttl).await;
            if evicted > 0 {
                let remaining = store.len().await;
                info!(
                    event_name = "system.orders.evicted",
                    evicted,
                    remaining,
                    "evicted stale pending orders"
                );
            } else {
                debug!(event_name = "system.orders.sweep", "no stale pending orders");
            }
        }
    })
}

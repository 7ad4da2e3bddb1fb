//! # Storage Area
//!
//! The persisted key/value area shared by every context of one origin (the
//! `localStorage` analogue), plus its change notifications (the `storage`
//! event analogue).
//!
//! ## Semantics
//!
//! - Each item operation is atomic on its own; nothing spans a
//!   read-modify-write.
//! - A change notification fires only when the stored value actually
//!   changes, and never in the context that made the write.
//! - Writes that would push the origin past its quota fail and leave the
//!   area untouched.

use crate::errors::StorageError;
use crate::ids::ContextId;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// A change made by another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// The writer. Never equal to the observing context.
    pub source: ContextId,
}

/// Port for the persisted area, as seen by one context.
pub trait StorageArea: Send + Sync {
    /// Read a value.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// `StorageError::QuotaExceeded` when the origin is full.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str);

    /// Subscribe to changes made by other contexts. `None` when the host
    /// does not deliver change notifications.
    fn watch(&self) -> Option<StorageWatcher>;
}

/// Receiving end of change notifications for one context.
pub struct StorageWatcher {
    rx: mpsc::UnboundedReceiver<StorageChange>,
}

impl StorageWatcher {
    /// Next pending change without waiting.
    pub fn try_next(&mut self) -> Option<StorageChange> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next change. `None` once the origin is gone.
    pub async fn next(&mut self) -> Option<StorageChange> {
        self.rx.recv().await
    }
}

struct WatcherSlot {
    owner: ContextId,
    tx: mpsc::UnboundedSender<StorageChange>,
}

struct OriginInner {
    items: Mutex<BTreeMap<String, String>>,
    watchers: Mutex<Vec<WatcherSlot>>,
    quota_bytes: Option<usize>,
    change_events: bool,
}

/// One origin's storage, shared by all of its contexts.
///
/// Cloning is cheap and yields another handle to the same area.
#[derive(Clone)]
pub struct OriginStorage {
    inner: Arc<OriginInner>,
}

impl OriginStorage {
    /// Unlimited origin with change notifications.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(None, true)
    }

    /// Origin with an optional byte quota (keys plus values) and optional
    /// change notifications.
    #[must_use]
    pub fn with_limits(quota_bytes: Option<usize>, change_events: bool) -> Self {
        Self {
            inner: Arc::new(OriginInner {
                items: Mutex::new(BTreeMap::new()),
                watchers: Mutex::new(Vec::new()),
                quota_bytes,
                change_events,
            }),
        }
    }

    /// The view one context gets.
    #[must_use]
    pub fn handle(&self, context: ContextId) -> StorageHandle {
        StorageHandle {
            origin: self.clone(),
            context,
        }
    }

    /// Whether the host delivers change notifications.
    #[must_use]
    pub fn supports_change_events(&self) -> bool {
        self.inner.change_events
    }

    /// Copy of every item, for snapshots.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner.items.lock().clone()
    }

    /// Replace every item. No notifications fire; used when an origin is
    /// rehydrated before any context opens.
    pub fn restore(&self, items: BTreeMap<String, String>) {
        *self.inner.items.lock() = items;
    }

    /// Bytes currently used (keys plus values).
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        Self::usage(&self.inner.items.lock())
    }

    fn usage(items: &BTreeMap<String, String>) -> usize {
        items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn write(&self, writer: ContextId, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let old_value = {
            let mut items = self.inner.items.lock();

            if let (Some(quota), Some(value)) = (self.inner.quota_bytes, value) {
                let current = Self::usage(&items);
                let replaced = items.get(key).map_or(0, |old| key.len() + old.len());
                let needed = current - replaced + key.len() + value.len();
                if needed > quota {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        bytes: needed,
                        quota,
                    });
                }
            }

            match value {
                Some(value) => items.insert(key.to_string(), value.to_string()),
                None => items.remove(key),
            }
        };

        if old_value.as_deref() == value {
            trace!(key, "Storage write left value unchanged, no notification");
            return Ok(());
        }

        if self.inner.change_events {
            self.notify(StorageChange {
                key: key.to_string(),
                old_value,
                new_value: value.map(str::to_string),
                source: writer,
            });
        }
        Ok(())
    }

    fn notify(&self, change: StorageChange) {
        let mut watchers = self.inner.watchers.lock();
        // Dropped watchers are pruned here.
        watchers.retain(|slot| {
            if slot.owner == change.source {
                return !slot.tx.is_closed();
            }
            slot.tx.send(change.clone()).is_ok()
        });
    }

    fn subscribe(&self, owner: ContextId) -> Option<StorageWatcher> {
        if !self.inner.change_events {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.watchers.lock().push(WatcherSlot { owner, tx });
        debug!(context = %owner, "Storage watcher registered");
        Some(StorageWatcher { rx })
    }
}

impl Default for OriginStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// One context's view of the origin storage.
#[derive(Clone)]
pub struct StorageHandle {
    origin: OriginStorage,
    context: ContextId,
}

impl StorageHandle {
    /// The context this handle writes as.
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// The shared origin behind this handle.
    #[must_use]
    pub fn origin(&self) -> &OriginStorage {
        &self.origin
    }
}

impl StorageArea for StorageHandle {
    fn get_item(&self, key: &str) -> Option<String> {
        self.origin.inner.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.origin.write(self.context, key, Some(value))
    }

    fn remove_item(&self, key: &str) {
        // Removal frees space, so it cannot hit the quota.
        let _ = self.origin.write(self.context, key, None);
    }

    fn watch(&self) -> Option<StorageWatcher> {
        self.origin.subscribe(self.context)
    }
}

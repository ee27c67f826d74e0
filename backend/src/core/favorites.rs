use std::collections::HashSet;
use std::fmt;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::core::models::{MediaItem, MediaKey, MediaType, ValidationError};
use crate::core::storage::StorageProvider;

/// Change notification delivered to observers, once per effective mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FavoritesEvent {
    Added(MediaItem),
    Removed(MediaKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type Observer = Box<dyn FnMut(&FavoritesEvent)>;

/// The user's saved titles, unique by (id, media type) and kept in
/// insertion order. Every effective mutation is written through to storage;
/// a failed write is logged and the in-memory state stays authoritative.
pub struct FavoritesStore<S: StorageProvider> {
    items: Vec<MediaItem>,
    keys: HashSet<MediaKey>,
    storage: S,
    observers: Vec<(SubscriptionId, Observer)>,
    durable: bool,
}

impl<S: StorageProvider> FavoritesStore<S> {
    /// Loads the persisted list. Missing or unreadable data starts the
    /// store empty instead of failing.
    pub fn open(storage: S) -> Self {
        let loaded = match storage.load_all() {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Favorites could not be loaded, starting empty");
                Vec::new()
            }
        };

        let mut items = Vec::with_capacity(loaded.len());
        let mut keys = HashSet::with_capacity(loaded.len());
        for item in loaded {
            if let Err(e) = item.validate() {
                warn!(key = %item.key(), error = %e, "Skipping invalid stored favorite");
                continue;
            }
            if keys.insert(item.key()) {
                items.push(item);
            } else {
                warn!(key = %item.key(), "Skipping duplicate stored favorite");
            }
        }

        debug!(count = items.len(), "Favorites loaded");
        Self {
            items,
            keys,
            storage,
            observers: Vec::new(),
            durable: true,
        }
    }

    pub fn is_favorite(&self, id: u32, media_type: MediaType) -> bool {
        self.keys.contains(&MediaKey::new(id, media_type))
    }

    /// Appends `item` unless its key is already present; the stored copy is
    /// never replaced. Returns whether the collection changed.
    pub fn add(&mut self, item: MediaItem) -> Result<bool, ValidationError> {
        item.validate()?;
        let key = item.key();
        if !self.keys.insert(key) {
            return Ok(false);
        }

        self.items.push(item.clone());
        self.persist();
        self.notify(&FavoritesEvent::Added(item));
        Ok(true)
    }

    /// Returns whether an entry was removed. Absent keys are a no-op.
    pub fn remove(&mut self, id: u32, media_type: MediaType) -> bool {
        let key = MediaKey::new(id, media_type);
        if !self.keys.remove(&key) {
            return false;
        }

        self.items.retain(|item| item.key() != key);
        self.persist();
        self.notify(&FavoritesEvent::Removed(key));
        true
    }

    /// Flips membership of `item` and returns the new membership.
    pub fn toggle(&mut self, item: MediaItem) -> Result<bool, ValidationError> {
        if self.is_favorite(item.id, item.media_type) {
            self.remove(item.id, item.media_type);
            Ok(false)
        } else {
            self.add(item)?;
            Ok(true)
        }
    }

    /// Snapshot in insertion order.
    pub fn list(&self) -> Vec<MediaItem> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// False when the latest write to storage failed.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&FavoritesEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.observers.push((id, Box::new(observer)));
        id
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn persist(&mut self) {
        match self.storage.save_all(&self.items) {
            Ok(()) => self.durable = true,
            Err(e) => {
                error!(error = %e, count = self.items.len(), "Favorites save failed, keeping in-memory state");
                self.durable = false;
            }
        }
    }

    fn notify(&mut self, event: &FavoritesEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}

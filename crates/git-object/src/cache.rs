//! Per-repository cache mapping digests to the single live typed-object instance.
//!
//! This is a weak-interning identity map, not a bounded LRU: there is no
//! capacity limit and no eviction policy other than the natural one that
//! occurs when the last `Arc<Object>` referencing a digest is dropped. Two
//! lookups of the same digest that both land while a live handle exists
//! observe the same `Arc` instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use git_hash::ObjectId;

use crate::Object;

/// Weak-interning cache of parsed objects, keyed by digest.
pub struct ObjectCache {
    entries: Mutex<HashMap<ObjectId, Weak<Object>>>,
}

impl ObjectCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a live instance for `oid`, if one is still held elsewhere.
    ///
    /// Stale (dropped) entries are pruned as they're discovered.
    pub fn get(&self, oid: &ObjectId) -> Option<Arc<Object>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(oid).and_then(Weak::upgrade) {
            Some(obj) => Some(obj),
            None => {
                entries.remove(oid);
                None
            }
        }
    }

    /// Intern `obj` under `oid`.
    ///
    /// If a live instance is already interned for this digest, that instance
    /// is returned instead and `obj` is dropped — the cache holds at most one
    /// live instance per digest. Otherwise `obj` becomes the live instance.
    pub fn intern(&self, oid: ObjectId, obj: Object) -> Arc<Object> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(&oid).and_then(Weak::upgrade) {
            return existing;
        }
        let arc = Arc::new(obj);
        entries.insert(oid, Arc::downgrade(&arc));
        arc
    }

    /// Whether `oid` currently has a live instance interned.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.get(oid).is_some()
    }

    /// Drop all weak entries, including ones still referencing live objects
    /// (the live `Arc`s held by callers remain valid; only the cache's own
    /// bookkeeping is cleared).
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of entries still tracked, live or stale.
    ///
    /// This is a bookkeeping count, not a count of live objects: call
    /// [`ObjectCache::prune`] first for an exact live count.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache currently tracks no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Remove entries whose object has already been dropped.
    pub fn prune(&self) {
        self.entries
            .lock()
            .unwrap()
            .retain(|_, weak| weak.strong_count() > 0);
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::RegionKey;
use parking_lot::Mutex;
use tracing::warn;

use crate::protocol::BoundaryRecord;
use crate::residency::BoundaryState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("boundary `{0}` is not pending")]
    NotPending(RegionKey),
}

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Resolved(Arc<BoundaryRecord>),
}

/// Session-scoped memo of fetched boundaries.
///
/// Notes:
/// - Keys are held in a `BTreeMap` for stable traversal order.
/// - At most one fetch per key is in flight: [`BoundaryCache::begin_fetch`]
///   checks and transitions under one lock.
/// - Resolved entries are kept for the life of the cache. There is no
///   eviction, so this is not suitable for a long-running server.
#[derive(Debug, Default)]
pub struct BoundaryCache {
    entries: Mutex<BTreeMap<RegionKey, Slot>>,
}

impl BoundaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &RegionKey) -> BoundaryState {
        match self.entries.lock().get(key) {
            None => BoundaryState::Absent,
            Some(Slot::Pending) => BoundaryState::Pending,
            Some(Slot::Resolved(_)) => BoundaryState::Resolved,
        }
    }

    /// The resolved boundary, if any.
    pub fn get(&self, key: &RegionKey) -> Option<Arc<BoundaryRecord>> {
        match self.entries.lock().get(key) {
            Some(Slot::Resolved(rec)) => Some(rec.clone()),
            _ => None,
        }
    }

    /// Claims the right to fetch `key`.
    ///
    /// Returns `false` if the key is already pending or resolved; the caller
    /// must not issue a request in that case.
    pub fn begin_fetch(&self, key: &RegionKey) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.clone(), Slot::Pending);
        true
    }

    /// `Pending → Resolved`.
    ///
    /// A key that is already resolved keeps its first boundary; the repeat is
    /// logged and ignored.
    pub fn resolve(&self, key: &RegionKey, record: BoundaryRecord) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(Slot::Resolved(_)) => {
                warn!("boundary {key} resolved twice; keeping the first");
                Ok(())
            }
            Some(slot) => {
                *slot = Slot::Resolved(Arc::new(record));
                Ok(())
            }
            None => Err(CacheError::NotPending(key.clone())),
        }
    }

    /// `Pending → Absent`, allowing a later retry.
    pub fn fail(&self, key: &RegionKey) -> Result<(), CacheError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(Slot::Pending) => {
                entries.remove(key);
                Ok(())
            }
            _ => Err(CacheError::NotPending(key.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|s| matches!(s, Slot::Resolved(_)))
            .count()
    }

    /// Resolved boundaries for `keys`, in `keys` order; unresolved keys are skipped.
    pub fn resolved_for<'a, I>(&self, keys: I) -> Vec<Arc<BoundaryRecord>>
    where
        I: IntoIterator<Item = &'a RegionKey>,
    {
        let entries = self.entries.lock();
        keys.into_iter()
            .filter_map(|k| match entries.get(k) {
                Some(Slot::Resolved(rec)) => Some(rec.clone()),
                _ => None,
            })
            .collect()
    }
}

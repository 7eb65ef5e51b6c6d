//! Session cache of resolved executable paths.

use crate::{ManagerId, SearchResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// A cached path lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedPath {
    /// A tier resolved the executable.
    Found(SearchResult),
    /// Every tier was tried and none found it.
    NotFound,
}

impl CachedPath {
    pub fn into_result(self) -> Option<SearchResult> {
        match self {
            Self::Found(result) => Some(result),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    path: Option<(CachedPath, Instant)>,
    available: Option<bool>,
}

/// In-memory map from manager id to its last resolved path and availability.
///
/// Entries live for the whole session unless a TTL is configured with
/// [`PathCache::with_ttl`] or the cache is cleared. Each manager id is an
/// independent entry; concurrent writers for the same id are last-write-wins.
///
/// ```rust
/// use pkgmgr_discovery::{CachedPath, ManagerId, PathCache};
///
/// let cache = PathCache::new();
/// assert!(cache.get_path(ManagerId::Conda).is_none());
///
/// cache.set_path(ManagerId::Conda, None);
/// assert_eq!(cache.get_path(ManagerId::Conda), Some(CachedPath::NotFound));
/// ```
#[derive(Debug, Default)]
pub struct PathCache {
    entries: Mutex<HashMap<ManagerId, Entry>>,
    ttl: Option<Duration>,
}

impl PathCache {
    /// A session-lived cache with no expiry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose path entries expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::default(),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Cached lookup for `manager`, including negative entries.
    pub fn get_path(&self, manager: ManagerId) -> Option<CachedPath> {
        let entries = self.lock();
        let (cached, stored_at) = entries.get(&manager)?.path.as_ref()?;
        if let Some(ttl) = self.ttl {
            if stored_at.elapsed() > ttl {
                debug!(%manager, "path cache entry expired");
                return None;
            }
        }
        Some(cached.clone())
    }

    /// Record a lookup. `None` stores a negative entry.
    pub fn set_path(&self, manager: ManagerId, result: Option<SearchResult>) {
        let cached = match result {
            Some(result) => CachedPath::Found(result),
            None => CachedPath::NotFound,
        };
        self.lock().entry(manager).or_default().path = Some((cached, Instant::now()));
    }

    pub fn get_availability(&self, manager: ManagerId) -> Option<bool> {
        self.lock().get(&manager)?.available
    }

    pub fn set_availability(&self, manager: ManagerId, available: bool) {
        self.lock().entry(manager).or_default().available = Some(available);
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ManagerId, Entry>> {
        // Entries are plain values, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

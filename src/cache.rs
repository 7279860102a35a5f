//! Run-scoped memo of place name to resolution.
//!
//! Rosters usually share a handful of home cities between many
//! consultants; each city is geocoded once per run. Failures are cached
//! too, so a misspelled city costs one lookup, not one per row.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::model::Resolution;

/// Hit/miss counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Place name → [`Resolution`], safe to share between workers.
///
/// Each key is filled at most once: the first caller runs the lookup while
/// holding that key's slot, and concurrent callers for the same key block
/// until it lands. An abandoned lookup leaves the slot empty.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, Arc<Mutex<Option<Resolution>>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed, case-folded cache key.
    pub fn normalize(place: &str) -> String {
        place.trim().to_lowercase()
    }

    /// Returns the cached resolution for `place`, running `resolve` on a miss.
    ///
    /// `resolve` receives the trimmed place name as written by the caller.
    pub fn get_or_resolve<F>(&self, place: &str, resolve: F) -> Resolution
    where
        F: FnOnce(&str) -> Resolution,
    {
        self.try_get_or_resolve(place, |place| Some(resolve(place)))
            .unwrap_or(Resolution::Unresolved)
    }

    /// As [`ResolutionCache::get_or_resolve`], but `resolve` may give up by
    /// returning `None`. Nothing is stored then, and a later call for the
    /// same place runs the lookup again.
    pub fn try_get_or_resolve<F>(&self, place: &str, resolve: F) -> Option<Resolution>
    where
        F: FnOnce(&str) -> Option<Resolution>,
    {
        let slot = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(Self::normalize(place)).or_default())
        };

        let mut slot = slot.lock();
        if let Some(resolution) = *slot {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(place, "resolution cache hit");
            return Some(resolution);
        }

        let resolution = resolve(place.trim())?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        *slot = Some(resolution);
        Some(resolution)
    }

    /// Looks up a place without resolving it.
    pub fn get(&self, place: &str) -> Option<Resolution> {
        let slot = self.entries.lock().get(&Self::normalize(place)).cloned()?;
        *slot.lock()
    }

    /// Number of places with a stored resolution.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

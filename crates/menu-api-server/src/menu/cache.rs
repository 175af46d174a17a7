use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use super::model::MenuSnapshot;

/// Single-entry TTL cache for the current menu snapshot.
///
/// The cache never raises: it reports validity and lets the caller decide
/// whether to refresh. Serving an expired entry after an acquisition failure
/// (`get_stale`) is a deliberate relaxation of the TTL under degradation.
pub struct MenuCache {
    entry: RwLock<Option<CacheEntry>>,
    ttl: Duration,
}

struct CacheEntry {
    snapshot: MenuSnapshot,
    stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }
}

/// Result of an administrative cache clear.
#[derive(Debug, Clone, Serialize)]
pub struct ClearOutcome {
    pub had_entry: bool,
    pub items_cleared: usize,
}

/// Read-only cache report.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub cached: bool,
    pub age_minutes: Option<f64>,
    pub ttl_minutes: u64,
    pub valid: bool,
    pub item_count: usize,
}

impl MenuCache {
    pub fn new(ttl_minutes: u64) -> Self {
        info!("Initializing menu cache (ttl: {} minutes)", ttl_minutes);
        Self {
            entry: RwLock::new(None),
            ttl: Duration::minutes(ttl_minutes as i64),
        }
    }

    /// Current snapshot if still within the TTL, annotated as cached.
    pub fn get(&self) -> Option<MenuSnapshot> {
        let guard = self.entry.read();
        let entry = guard.as_ref()?;
        if entry.age() >= self.ttl {
            debug!("Cache entry expired ({}s old)", entry.age().num_seconds());
            return None;
        }
        Some(annotate(entry, false))
    }

    /// Current snapshot regardless of age, annotated as stale. Last-resort
    /// path when fresh acquisition has failed.
    pub fn get_stale(&self) -> Option<MenuSnapshot> {
        let guard = self.entry.read();
        let entry = guard.as_ref()?;
        Some(annotate(entry, true))
    }

    pub fn put(&self, snapshot: MenuSnapshot) {
        debug!("Caching snapshot with {} items", snapshot.item_count());
        *self.entry.write() = Some(CacheEntry {
            snapshot,
            stored_at: Utc::now(),
        });
    }

    pub fn clear(&self) -> ClearOutcome {
        let previous = self.entry.write().take();
        let outcome = ClearOutcome {
            had_entry: previous.is_some(),
            items_cleared: previous.map(|e| e.snapshot.item_count()).unwrap_or(0),
        };
        info!(
            "Cache cleared (had_entry: {}, items: {})",
            outcome.had_entry, outcome.items_cleared
        );
        outcome
    }

    pub fn status(&self) -> CacheStatus {
        let guard = self.entry.read();
        match guard.as_ref() {
            Some(entry) => {
                let age = entry.age();
                CacheStatus {
                    cached: true,
                    age_minutes: Some(age.num_seconds() as f64 / 60.0),
                    ttl_minutes: self.ttl.num_minutes() as u64,
                    valid: age < self.ttl,
                    item_count: entry.snapshot.item_count(),
                }
            }
            None => CacheStatus {
                cached: false,
                age_minutes: None,
                ttl_minutes: self.ttl.num_minutes() as u64,
                valid: false,
                item_count: 0,
            },
        }
    }

    #[cfg(test)]
    fn put_with_age(&self, snapshot: MenuSnapshot, age: Duration) {
        *self.entry.write() = Some(CacheEntry {
            snapshot,
            stored_at: Utc::now() - age,
        });
    }
}

fn annotate(entry: &CacheEntry, stale: bool) -> MenuSnapshot {
    let mut snapshot = entry.snapshot.clone();
    snapshot.cached = true;
    snapshot.cache_timestamp = Some(entry.stored_at);
    snapshot.stale = stale;
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::model::{MenuItem, MenuSource};

    fn snapshot(count: usize) -> MenuSnapshot {
        let items = (0..count)
            .map(|i| MenuItem::new(format!("Item {}", i), "", "$1.00", "General"))
            .collect();
        MenuSnapshot::new(items, MenuSource::StaticPage)
    }

    #[test]
    fn test_fresh_entry_is_served() {
        let cache = MenuCache::new(30);
        cache.put(snapshot(2));

        let got = cache.get().expect("fresh entry");
        assert!(got.cached);
        assert!(!got.stale);
        assert!(got.cache_timestamp.is_some());
        assert_eq!(got.item_count(), 2);
    }

    #[test]
    fn test_ttl_boundary() {
        let cache = MenuCache::new(1);

        // One second inside the window: valid.
        cache.put_with_age(snapshot(1), Duration::seconds(59));
        assert!(cache.get().is_some());

        // One second past the window: invalid.
        cache.put_with_age(snapshot(1), Duration::seconds(61));
        assert!(cache.get().is_none());
        assert!(cache.status().cached);
        assert!(!cache.status().valid);
    }

    #[test]
    fn test_expired_entry_still_available_stale() {
        let cache = MenuCache::new(1);
        cache.put_with_age(snapshot(3), Duration::hours(6));

        assert!(cache.get().is_none());
        let stale = cache.get_stale().expect("stale entry");
        assert!(stale.stale);
        assert_eq!(stale.item_count(), 3);
    }

    #[test]
    fn test_clear_reports_prior_contents() {
        let cache = MenuCache::new(30);
        cache.put(snapshot(4));

        let outcome = cache.clear();
        assert!(outcome.had_entry);
        assert_eq!(outcome.items_cleared, 4);

        let outcome = cache.clear();
        assert!(!outcome.had_entry);
        assert_eq!(outcome.items_cleared, 0);
    }

    #[test]
    fn test_status_on_empty_cache() {
        let cache = MenuCache::new(15);
        let status = cache.status();
        assert!(!status.cached);
        assert!(!status.valid);
        assert_eq!(status.age_minutes, None);
        assert_eq!(status.ttl_minutes, 15);
        assert_eq!(status.item_count, 0);
    }
}

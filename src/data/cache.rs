use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::model::Table;

/// How long a fetched dataset is served from memory before the next read
/// goes back to the store.
pub const DATA_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    table: Arc<Table>,
    fetched_at: Instant,
}

/// In-memory dataset cache keyed by object key. Entries expire after a TTL;
/// a manual refresh drops everything at once.
#[derive(Default)]
pub struct SnapshotCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `key`, fetching it with `fetch` when the
    /// entry is absent or older than `ttl`. Failed fetches are not cached.
    pub fn get_or_fetch(
        &mut self,
        key: &str,
        ttl: Duration,
        fetch: impl FnOnce() -> anyhow::Result<Table>,
    ) -> anyhow::Result<Arc<Table>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.fetched_at.elapsed() < ttl {
                log::debug!("cache hit for {key}");
                return Ok(Arc::clone(&entry.table));
            }
            log::debug!("cache entry for {key} expired");
        }

        let table = Arc::new(fetch()?);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                table: Arc::clone(&table),
                fetched_at: Instant::now(),
            },
        );
        Ok(table)
    }

    /// Drop all entries, forcing the next load to hit the store.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

use actix_web::web::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Key prefix of the cached index listing.
pub const INDEX_CACHE_PREFIX: &str = "index_page";

/// Expired entries are swept once per this many inserts.
const SWEEP_INTERVAL: usize = 64;

struct CachedPage {
    body: Bytes,
    expires_at: Instant,
}

/// Rendered pages kept for a fixed time-to-live.
/// Entries are never invalidated by writes; they only expire.
pub struct PageCache {
    entries: DashMap<String, CachedPage>,
    ttl: Duration,
    inserts: AtomicUsize,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            inserts: AtomicUsize::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Builds a cache key from a prefix, the full request path and the viewer.
    /// Pages differ between guests and users, so the viewer is part of the key.
    pub fn key(prefix: &str, full_path: &str, user_id: Option<i32>) -> String {
        match user_id {
            Some(id) => format!("{}:{}:user-{}", prefix, full_path, id),
            None => format!("{}:{}:guest", prefix, full_path),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: String, body: Bytes) {
        self.insert_at(key, body, Instant::now())
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Bytes> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.body.clone()),
            Some(_) => {}
            None => return None,
        };
        // Expired. The read guard must be released before removal.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    fn insert_at(&self, key: String, body: Bytes, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        if self.inserts.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep_at(now);
        }
        self.entries.insert(
            key,
            CachedPage {
                body,
                expires_at: now + self.ttl,
            },
        );
    }

    fn sweep_at(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

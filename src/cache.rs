//! In-memory reading cache with logical TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::fingerprint::Fingerprint;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 30);

#[derive(Debug, Clone)]
struct CacheEntry {
    /// `None` when `now + ttl` does not fit in an `Instant`; such entries never expire.
    expires_at: Option<Instant>,
    text: String,
}

/// Fingerprint → generated reading.
///
/// Expired entries stay in the map until overwritten but are never returned.
/// There is no capacity bound.
#[derive(Debug, Clone)]
pub struct ReadingCache {
    ttl: Duration,
    entries: HashMap<Fingerprint, CacheEntry>,
}

impl Default for ReadingCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ReadingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get_at(&self, key: &Fingerprint, now: Instant) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at.is_none_or(|at| now < at))
            .map(|entry| entry.text.as_str())
    }

    /// Store `text` until `now + ttl`, replacing any previous entry.
    pub fn put_at(&mut self, key: Fingerprint, text: String, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                expires_at: now.checked_add(self.ttl),
                text,
            },
        );
    }

    /// Physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

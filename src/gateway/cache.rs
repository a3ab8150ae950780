//! Query result cache
//!
//! Exact-match cache keyed by a fingerprint of the normalized SQL text and
//! the scope (catalog/schema) it ran in. Entries expire lazily on read; at capacity the oldest insertion is
//! evicted (FIFO, reads never promote an entry).

use crate::db::types::ResultSet;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default time-to-live for stored results
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// SHA-256 of the scope followed by the trimmed, lower-cased SQL text
///
/// The scope is hashed verbatim: catalog names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(scope: &str, sql: &str) -> Self {
        let normalized = sql.trim().to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(scope.as_bytes());
        hasher.update(b"\n");
        hasher.update(normalized.as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for log lines
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: ResultSet,
    created_at: Instant,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Insertion order; front is the next eviction victim
    order: VecDeque<Fingerprint>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn remove(&mut self, key: &Fingerprint) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage with two decimals, or `"0%"` before any lookup
    pub hit_rate: String,
}

/// Bounded FIFO result cache with per-entry expiry
#[derive(Debug)]
pub struct QueryCache {
    state: Mutex<CacheState>,
    max_entries: usize,
    default_ttl: Duration,
}

impl QueryCache {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries,
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic mid-update can only leave counters stale, never a broken map
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the stored result for `sql` in `scope` if present and unexpired
    pub fn lookup(&self, scope: &str, sql: &str) -> Option<ResultSet> {
        let key = Fingerprint::of(scope, sql);
        let now = Instant::now();
        let mut guard = self.lock();
        let state = &mut *guard;

        let expired = match state.entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => {
                state.hits += 1;
                tracing::debug!(
                    fingerprint = %key,
                    age_ms = now.duration_since(entry.created_at).as_millis() as u64,
                    "Cache hit"
                );
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.remove(&key);
            tracing::debug!(fingerprint = %key, "Cache entry expired");
        }
        state.misses += 1;
        None
    }

    /// Store `value` under `sql` in `scope` with the default TTL
    pub fn store(&self, scope: &str, sql: &str, value: ResultSet) {
        self.store_with_ttl(scope, sql, value, self.default_ttl);
    }

    /// Store `value` under `sql` in `scope`, expiring after `ttl`
    pub fn store_with_ttl(&self, scope: &str, sql: &str, value: ResultSet, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }
        let key = Fingerprint::of(scope, sql);
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: now.checked_add(ttl),
        };
        let mut state = self.lock();

        if let Some(existing) = state.entries.get_mut(&key) {
            // Replaced in place; keeps its queue position
            *existing = entry;
            return;
        }

        if state.entries.len() >= self.max_entries {
            if let Some(victim) = state.order.pop_front() {
                state.entries.remove(&victim);
                tracing::debug!(fingerprint = %victim, "Evicted oldest cache entry");
            }
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, entry);
    }

    /// Drop every entry; hit/miss counters are kept
    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.order.clear();
        tracing::info!(dropped, "Query cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let total = state.hits + state.misses;
        let hit_rate = if total == 0 {
            "0%".to_string()
        } else {
            format!("{:.2}%", state.hits as f64 / total as f64 * 100.0)
        };
        CacheStats {
            size: state.entries.len(),
            max_size: self.max_entries,
            hits: state.hits,
            misses: state.misses,
            hit_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(100, DEFAULT_TTL)
    }
}

//! Tachyon Store - Key-Value Collaborator Interface
//!
//! The external store contract and an in-memory implementation for tests
//! and development. The store holds one hash-like key per chunk with one
//! field per bin; `merge_field` is the single atomic read-modify-write
//! round trip, so no two concurrent writers can interleave a merge. A
//! networked implementation (e.g. Redis) backs each kind's merge with a
//! server-side script; the in-memory store holds its write lock across the
//! whole decode-merge-encode sequence instead.
//!
//! Key Features:
//! - Async trait so real deployments can sit on a network client
//! - Atomic per-field merge with all-or-nothing semantics
//! - Bulk field reads for range reconstruction
//! - Native key expiry with TTL-reset-replaces-prior-TTL semantics
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use crate::aggregation;
use crate::encoding;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tachyon_common::{AggregateKind, Result, TachyonError};

// =============================================================================
// Key-Value Store Trait
// =============================================================================

/// Contract the external key-value store must provide.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically fold `value` into the field's stored slot state under
    /// `kind`. Either the merge fully succeeds or the field is left exactly
    /// as it was; partial merges must be impossible. `token` orders
    /// concurrent `Last` writes and is ignored by every other kind.
    async fn merge_field(
        &self,
        key: &str,
        field: u32,
        kind: AggregateKind,
        value: f64,
        token: i64,
    ) -> Result<()>;

    /// Bulk point read of raw field values; absent fields (never written,
    /// or gone with an expired key) come back as `None`.
    async fn read_fields(&self, key: &str, fields: &[u32]) -> Result<Vec<Option<String>>>;

    /// Set or extend the key's TTL, replacing any prior TTL.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()>;
}

// =============================================================================
// Store Statistics
// =============================================================================

/// Operation counters for the in-memory store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub merge_ops: u64,
    pub read_ops: u64,
    pub expire_ops: u64,
}

// =============================================================================
// Memory Store
// =============================================================================

struct KeyEntry {
    fields: HashMap<u32, String>,
    expires_at: Option<Instant>,
}

impl KeyEntry {
    fn new() -> Self {
        Self {
            fields: HashMap::new(),
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// In-memory key-value store for testing and development.
pub struct MemoryStore {
    keys: RwLock<HashMap<String, KeyEntry>>,
    stats: RwLock<StoreStats>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            stats: RwLock::new(StoreStats::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate the store becoming unreachable: while set, every operation
    /// fails with `StorageUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Simulate store-side eviction of a key, as native expiry would do.
    pub fn remove_key(&self, key: &str) -> bool {
        self.keys.write().remove(key).is_some()
    }

    /// Whether a live (non-expired) key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys
            .read()
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    pub fn stats(&self) -> StoreStats {
        *self.stats.read()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TachyonError::StorageUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn merge_field(
        &self,
        key: &str,
        field: u32,
        kind: AggregateKind,
        value: f64,
        token: i64,
    ) -> Result<()> {
        self.check_available()?;

        let mut keys = self.keys.write();
        let entry = keys.entry(key.to_string()).or_insert_with(KeyEntry::new);
        if entry.is_expired() {
            // The real store would have evicted it already.
            entry.fields.clear();
            entry.expires_at = None;
        }

        let existing = match entry.fields.get(&field) {
            Some(raw) => Some(encoding::decode(kind, raw)?),
            None => None,
        };
        let merged = aggregation::merge(kind, existing, value, token);
        entry.fields.insert(field, encoding::encode(&merged));

        self.stats.write().merge_ops += 1;
        Ok(())
    }

    async fn read_fields(&self, key: &str, fields: &[u32]) -> Result<Vec<Option<String>>> {
        self.check_available()?;

        let keys = self.keys.read();
        let entry = keys.get(key).filter(|entry| !entry.is_expired());

        let values = fields
            .iter()
            .map(|field| entry.and_then(|e| e.fields.get(field).cloned()))
            .collect();

        drop(keys);
        self.stats.write().read_ops += 1;
        Ok(values)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()> {
        self.check_available()?;

        let mut keys = self.keys.write();
        if let Some(entry) = keys.get_mut(key) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_seconds));
        }

        self.stats.write().expire_ops += 1;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_merge_and_read_back() {
        let store = MemoryStore::new();
        store
            .merge_field("k", 3, AggregateKind::Avg, 10.0, 0)
            .await
            .expect("merge should succeed");
        store
            .merge_field("k", 3, AggregateKind::Avg, 20.0, 0)
            .await
            .expect("merge should succeed");

        let raw = store
            .read_fields("k", &[2, 3])
            .await
            .expect("read should succeed");
        assert_eq!(raw[0], None);
        assert_eq!(raw[1].as_deref(), Some("avg:30:2"));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_verbatim() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = store
            .merge_field("k", 0, AggregateKind::Sum, 1.0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TachyonError::StorageUnavailable(_)));
        let err = store.read_fields("k", &[0]).await.unwrap_err();
        assert!(matches!(err, TachyonError::StorageUnavailable(_)));

        store.set_unavailable(false);
        assert!(store.merge_field("k", 0, AggregateKind::Sum, 1.0, 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_removed_key_reads_absent() {
        let store = MemoryStore::new();
        store
            .merge_field("k", 0, AggregateKind::Sum, 1.0, 0)
            .await
            .expect("merge should succeed");
        assert!(store.contains_key("k"));

        assert!(store.remove_key("k"));
        let raw = store.read_fields("k", &[0]).await.expect("read should succeed");
        assert_eq!(raw, vec![None]);
    }

    #[tokio::test]
    async fn test_expired_key_reads_absent() {
        let store = MemoryStore::new();
        store
            .merge_field("k", 0, AggregateKind::Sum, 1.0, 0)
            .await
            .expect("merge should succeed");
        store.expire("k", 0).await.expect("expire should succeed");

        let raw = store.read_fields("k", &[0]).await.expect("read should succeed");
        assert_eq!(raw, vec![None]);
        assert!(!store.contains_key("k"));
    }

    #[tokio::test]
    async fn test_concurrent_counts_are_additive() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store
                        .merge_field("k", 0, AggregateKind::Count, 1.0, 0)
                        .await
                        .expect("merge should succeed");
                }
            }));
        }
        for handle in handles {
            handle.await.expect("task should finish");
        }

        let raw = store.read_fields("k", &[0]).await.expect("read should succeed");
        assert_eq!(raw[0].as_deref(), Some("count:400"));
        assert_eq!(store.stats().merge_ops, 400);
    }
}

//! Tachyon Chunk - Chunk Store Adapter
//!
//! Adapter between the engine and the key-value collaborator. Derives the
//! storage key for a (series, rule, chunk) triple, drives the atomic field
//! merge, refreshes the chunk TTL after successful writes, and decodes bulk
//! slot reads. Keys incorporate the rule id because two rules may bucket
//! the same series name differently.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use crate::aggregation::SlotState;
use crate::encoding;
use crate::store::KeyValueStore;
use std::sync::Arc;
use tachyon_common::{AggregateKind, Result, Rule, RuleId};

// =============================================================================
// Chunk Store
// =============================================================================

/// Derives storage keys and drives per-slot updates against the store.
pub struct ChunkStore {
    store: Arc<dyn KeyValueStore>,
    key_prefix: String,
}

impl ChunkStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Deterministic, collision-free key for one chunk of one (series, rule)
    /// pair: `<prefix>:<rule_id>:<step>:<chunk_index>:<series>`. The series
    /// name goes last so names containing the separator stay unambiguous.
    pub fn storage_key(
        &self,
        series_name: &str,
        rule_id: RuleId,
        rule: &Rule,
        chunk_index: i64,
    ) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.key_prefix, rule_id, rule.step_seconds, chunk_index, series_name
        )
    }

    /// Merge one sample into one slot, as a single atomic round trip.
    pub async fn apply(
        &self,
        key: &str,
        slot_index: u32,
        kind: AggregateKind,
        value: f64,
        token: i64,
    ) -> Result<()> {
        self.store.merge_field(key, slot_index, kind, value, token).await
    }

    /// Refresh the chunk's TTL; retention 0 means the key never expires and
    /// no TTL is ever set.
    pub async fn refresh_ttl(&self, key: &str, retention_seconds: u64) -> Result<()> {
        if retention_seconds == 0 {
            return Ok(());
        }
        self.store.expire(key, retention_seconds).await
    }

    /// Bulk point read of slots, decoded into slot states. Absent slots stay
    /// `None`; corrupt payloads surface as errors rather than absences.
    pub async fn read_slots(
        &self,
        key: &str,
        kind: AggregateKind,
        slot_indices: &[u32],
    ) -> Result<Vec<Option<SlotState>>> {
        let raw = self.store.read_fields(key, slot_indices).await?;
        raw.into_iter()
            .map(|value| value.map(|raw| encoding::decode(kind, &raw)).transpose())
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

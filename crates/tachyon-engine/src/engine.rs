//! Tachyon Engine - Rule-Driven Ingestion and Range Reads
//!
//! Orchestrates the full sample path: pattern dispatch, bin addressing,
//! atomic slot merge, TTL refresh, and range reconstruction. The engine
//! holds no lock across store round trips; cross-writer correctness is
//! delegated entirely to the store's atomic field merge.
//!
//! Key Features:
//! - Append-only rule registration with eager validation
//! - Best-effort fan-out: one rule's failure never blocks the others
//! - Range reads grouped into one bulk read per chunk
//! - Expired or never-written bins read back as absent, not as errors
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use crate::addressing::{self, ChunkAddress};
use crate::chunk::ChunkStore;
use crate::matcher::PatternMatcher;
use crate::store::KeyValueStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tachyon_common::{
    AggregateKind, EngineConfig, Result, Rule, RuleId, Sample, TachyonError,
};
use tracing::{debug, info, warn};

// =============================================================================
// Write Outcome
// =============================================================================

/// Result of fanning one sample out to its matching rules.
///
/// Per-rule applications are independent and best-effort: failures are
/// collected here, verbatim, rather than short-circuiting the fan-out or
/// being swallowed.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// How many rules matched the series name.
    pub matched: usize,
    /// How many of those were fully applied (merge + TTL refresh).
    pub applied: usize,
    /// Failures per rule, surfaced verbatim.
    pub failures: Vec<(RuleId, TachyonError)>,
}

impl WriteOutcome {
    /// Whether every matched rule was applied.
    pub fn fully_applied(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Rule Engine
// =============================================================================

/// The rule-driven binning, chunk-addressing and aggregation engine.
///
/// One explicit instance owns the append-only rule registry; callers share
/// it (typically behind an `Arc`) rather than relying on process globals.
pub struct RuleEngine {
    matcher: RwLock<PatternMatcher>,
    chunks: ChunkStore,
}

impl RuleEngine {
    /// Create an engine over a store with default configuration.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine over a store with explicit configuration.
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: EngineConfig) -> Self {
        Self {
            matcher: RwLock::new(PatternMatcher::new(config.match_mode)),
            chunks: ChunkStore::new(store, config.key_prefix),
        }
    }

    // -------------------------------------------------------------------------
    // Rule Registration
    // -------------------------------------------------------------------------

    /// Register a rule. Validation is eager: a bad pattern, non-positive
    /// step or chunk size is rejected here and never reaches a merge.
    pub fn register_rule(
        &self,
        pattern: &str,
        field_name: &str,
        step_seconds: i64,
        chunk_size: u32,
        retention_seconds: u64,
        kind: AggregateKind,
    ) -> Result<RuleId> {
        let id = self.matcher.write().register(
            pattern,
            field_name,
            step_seconds,
            chunk_size,
            retention_seconds,
            kind,
        )?;
        info!(
            rule_id = id.0,
            pattern, step_seconds, chunk_size, retention_seconds, kind = %kind,
            "registered rule"
        );
        Ok(id)
    }

    /// Register a rule from its one-line text form:
    /// `pattern field_name step chunk_size retention kind`.
    pub fn load_rule(&self, line: &str) -> Result<RuleId> {
        let mut matcher = self.matcher.write();
        let rule = Rule::parse_line(line, matcher.mode())?;
        let id = matcher.insert(rule);
        info!(rule_id = id.0, line, "loaded rule");
        Ok(id)
    }

    /// Look up a registered rule by id.
    pub fn rule(&self, id: RuleId) -> Result<Rule> {
        self.matcher.read().get(id).cloned()
    }

    pub fn rule_count(&self) -> usize {
        self.matcher.read().len()
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    /// Fan one sample out to every matching rule.
    ///
    /// A sample matching no rule is silently dropped; that is not an error,
    /// there is no default rule. The timestamp is validated once, up front,
    /// since it is shared by the whole fan-out.
    pub async fn add_sample(
        &self,
        series_name: &str,
        value: f64,
        timestamp: i64,
    ) -> Result<WriteOutcome> {
        if timestamp < 0 {
            return Err(TachyonError::InvalidTimestamp(timestamp));
        }

        // Snapshot the matching rules so no lock is held across store calls.
        let matched: Vec<(RuleId, Rule)> = {
            let matcher = self.matcher.read();
            matcher
                .matching(series_name)
                .into_iter()
                .map(|(id, rule)| (id, rule.clone()))
                .collect()
        };

        let mut outcome = WriteOutcome {
            matched: matched.len(),
            ..WriteOutcome::default()
        };

        if matched.is_empty() {
            debug!(series = series_name, "no rule matched, sample dropped");
            return Ok(outcome);
        }

        for (id, rule) in &matched {
            match self.apply_rule(series_name, *id, rule, value, timestamp).await {
                Ok(()) => outcome.applied += 1,
                Err(err) => {
                    warn!(series = series_name, rule_id = id.0, %err, "rule application failed");
                    outcome.failures.push((*id, err));
                }
            }
        }

        Ok(outcome)
    }

    /// Ingest a batch of samples, one outcome per sample. An invalid
    /// timestamp fails its own sample without aborting the rest.
    pub async fn add_batch(&self, samples: &[Sample]) -> Vec<Result<WriteOutcome>> {
        let mut outcomes = Vec::with_capacity(samples.len());
        for sample in samples {
            outcomes.push(
                self.add_sample(&sample.series_name, sample.value, sample.timestamp)
                    .await,
            );
        }
        outcomes
    }

    async fn apply_rule(
        &self,
        series_name: &str,
        id: RuleId,
        rule: &Rule,
        value: f64,
        timestamp: i64,
    ) -> Result<()> {
        let addr = addressing::locate(rule, timestamp)?;
        let key = self.chunks.storage_key(series_name, id, rule, addr.chunk_index);

        self.chunks
            .apply(&key, addr.slot_index, rule.kind, value, timestamp)
            .await?;
        self.chunks.refresh_ttl(&key, rule.retention_seconds).await
    }

    // -------------------------------------------------------------------------
    // Range Reads
    // -------------------------------------------------------------------------

    /// Reconstruct the series one rule stored for a name over `[start_ts,
    /// end_ts)`, one entry per bin in increasing time order. A bin that was
    /// never written, or whose chunk has expired, yields `None`; a gap mid
    /// range does not terminate the read.
    ///
    /// Not transactional across chunks: writes racing a multi-chunk read may
    /// be visible in some chunks and not others.
    pub async fn read_range(
        &self,
        series_name: &str,
        rule_id: RuleId,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<(i64, Option<f64>)>> {
        let rule = self.rule(rule_id)?;
        if start_ts < 0 {
            return Err(TachyonError::InvalidTimestamp(start_ts));
        }
        if end_ts < 0 {
            return Err(TachyonError::InvalidTimestamp(end_ts));
        }
        if end_ts <= start_ts {
            return Ok(Vec::new());
        }

        let first_bin = start_ts / rule.step_seconds;
        let last_bin = (end_ts - 1) / rule.step_seconds;

        // Group the bin range by chunk so each chunk costs one bulk read.
        let mut by_chunk: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for bin in first_bin..=last_bin {
            let ChunkAddress { chunk_index, .. } = addressing::locate_bin(&rule, bin);
            by_chunk.entry(chunk_index).or_default().push(bin);
        }

        let mut series = Vec::with_capacity((last_bin - first_bin + 1) as usize);
        for (chunk_index, bins) in by_chunk {
            let key = self.chunks.storage_key(series_name, rule_id, &rule, chunk_index);
            let slots: Vec<u32> = bins
                .iter()
                .map(|bin| addressing::locate_bin(&rule, *bin).slot_index)
                .collect();

            let states = self.chunks.read_slots(&key, rule.kind, &slots).await?;
            for (bin, state) in bins.iter().zip(states) {
                series.push((
                    addressing::bin_start(&rule, *bin),
                    state.map(|s| s.finalize(rule.step_seconds)),
                ));
            }
        }

        Ok(series)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Tachyon Engine - Rule-Driven Time Series Aggregation
//!
//! Turns a stream of named scalar measurements into compact, automatically
//! aggregated, time-bucketed series persisted in an external key-value
//! store. Users declare rules (pattern + binning + aggregation + retention),
//! not individual series; every incoming sample is fanned out to all
//! matching rules, merged atomically into exactly the slot it addresses,
//! and read back by range with one bulk read per chunk.
//!
//! Key Features:
//! - Regex rule dispatch with deliberate multi-rule fan-out
//! - Pure bin/chunk/slot addressing from rule parameters
//! - Commutative per-kind merges safe under concurrent writers
//! - Chunk keys with store-native TTL expiry, refreshed on every write
//! - Range reconstruction that reports gaps as absent, never as errors
//!
//! @version 0.1.0
//! @author Tachyon Development Team

pub mod addressing;
pub mod aggregation;
pub mod chunk;
pub mod encoding;
pub mod engine;
pub mod matcher;
pub mod store;

pub use addressing::ChunkAddress;
pub use aggregation::SlotState;
pub use chunk::ChunkStore;
pub use engine::{RuleEngine, WriteOutcome};
pub use matcher::PatternMatcher;
pub use store::{KeyValueStore, MemoryStore, StoreStats};

pub use tachyon_common::{
    AggregateKind, EngineConfig, MatchMode, Result, Rule, RuleId, Sample, TachyonError,
};

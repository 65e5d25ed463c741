//! Tachyon Aggregation - Per-Kind Slot Merging
//!
//! Merge and finalize functions combining a new sample with the state
//! already held in a slot. Every kind except `Last` is associative and
//! commutative, so concurrent merges commute; `Last` carries an ordering
//! token so a stale write is rejected inside the same merge.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use serde::{Deserialize, Serialize};
use tachyon_common::AggregateKind;

// =============================================================================
// Slot State
// =============================================================================

/// The accumulator for one (series, rule, bin) triple.
///
/// Each kind keeps exactly the state it needs to finalize later, tagged
/// explicitly so two rules aggregating the same field name can never be
/// confused with each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlotState {
    Avg { sum: f64, count: u64 },
    Sum { sum: f64 },
    Min { min: f64 },
    Max { max: f64 },
    Last { value: f64, token: i64 },
    Count { count: u64 },
    Rate { sum: f64 },
}

impl SlotState {
    /// The aggregation kind this state belongs to.
    pub fn kind(&self) -> AggregateKind {
        match self {
            Self::Avg { .. } => AggregateKind::Avg,
            Self::Sum { .. } => AggregateKind::Sum,
            Self::Min { .. } => AggregateKind::Min,
            Self::Max { .. } => AggregateKind::Max,
            Self::Last { .. } => AggregateKind::Last,
            Self::Count { .. } => AggregateKind::Count,
            Self::Rate { .. } => AggregateKind::Rate,
        }
    }

    /// Collapse the state into its final scalar. Idempotent: the state is
    /// not consumed and repeated calls return identical results.
    ///
    /// `step_seconds` is only consulted by `Rate`, which reports the
    /// accumulated sum as a per-second rate over the bin.
    pub fn finalize(&self, step_seconds: i64) -> f64 {
        match self {
            Self::Avg { sum, count } => sum / *count as f64,
            Self::Sum { sum } => *sum,
            Self::Min { min } => *min,
            Self::Max { max } => *max,
            Self::Last { value, .. } => *value,
            Self::Count { count } => *count as f64,
            Self::Rate { sum } => sum / step_seconds as f64,
        }
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Fold `value` into `existing`, producing the new slot state.
///
/// An absent slot starts from the kind's identity. A state left over from a
/// different kind (possible only if a stored payload was rewritten out of
/// band) is treated as absent rather than combined across kinds.
pub fn merge(
    kind: AggregateKind,
    existing: Option<SlotState>,
    value: f64,
    token: i64,
) -> SlotState {
    match (kind, existing) {
        (AggregateKind::Avg, Some(SlotState::Avg { sum, count })) => SlotState::Avg {
            sum: sum + value,
            count: count + 1,
        },
        (AggregateKind::Avg, _) => SlotState::Avg {
            sum: value,
            count: 1,
        },

        (AggregateKind::Sum, Some(SlotState::Sum { sum })) => SlotState::Sum { sum: sum + value },
        (AggregateKind::Sum, _) => SlotState::Sum { sum: value },

        (AggregateKind::Min, Some(SlotState::Min { min })) => SlotState::Min {
            min: min.min(value),
        },
        (AggregateKind::Min, _) => SlotState::Min { min: value },

        (AggregateKind::Max, Some(SlotState::Max { max })) => SlotState::Max {
            max: max.max(value),
        },
        (AggregateKind::Max, _) => SlotState::Max { max: value },

        // Larger-or-equal token wins; a stale writer leaves the slot alone.
        (AggregateKind::Last, Some(SlotState::Last { value: kept, token: held })) => {
            if token >= held {
                SlotState::Last { value, token }
            } else {
                SlotState::Last {
                    value: kept,
                    token: held,
                }
            }
        }
        (AggregateKind::Last, _) => SlotState::Last { value, token },

        (AggregateKind::Count, Some(SlotState::Count { count })) => {
            SlotState::Count { count: count + 1 }
        }
        (AggregateKind::Count, _) => SlotState::Count { count: 1 },

        (AggregateKind::Rate, Some(SlotState::Rate { sum })) => SlotState::Rate { sum: sum + value },
        (AggregateKind::Rate, _) => SlotState::Rate { sum: value },
    }
}

// =============================================================================
// Tests
// =============================================================================

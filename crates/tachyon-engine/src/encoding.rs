//! Tachyon Encoding - Slot State Wire Layout
//!
//! Fixed, kind-tagged text layout for a slot state stored in one hash
//! field. The field holds the aggregation state, never the raw sample:
//!
//! - `avg:<sum>:<count>`
//! - `sum:<sum>`, `rate:<sum>`
//! - `min:<v>`, `max:<v>`
//! - `last:<value>@<token>`
//! - `count:<n>`
//!
//! Decoding validates the tag against the rule's kind so a payload written
//! under a different kind surfaces as a corruption error instead of being
//! reinterpreted.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use crate::aggregation::SlotState;
use tachyon_common::{AggregateKind, Result, TachyonError};

// =============================================================================
// Encode
// =============================================================================

/// Encode a slot state into its stored field value.
pub fn encode(state: &SlotState) -> String {
    match state {
        SlotState::Avg { sum, count } => format!("avg:{}:{}", sum, count),
        SlotState::Sum { sum } => format!("sum:{}", sum),
        SlotState::Min { min } => format!("min:{}", min),
        SlotState::Max { max } => format!("max:{}", max),
        SlotState::Last { value, token } => format!("last:{}@{}", value, token),
        SlotState::Count { count } => format!("count:{}", count),
        SlotState::Rate { sum } => format!("rate:{}", sum),
    }
}

// =============================================================================
// Decode
// =============================================================================

/// Decode a stored field value back into a slot state for `kind`.
pub fn decode(kind: AggregateKind, raw: &str) -> Result<SlotState> {
    let (tag, body) = raw
        .split_once(':')
        .ok_or_else(|| TachyonError::Encoding(format!("missing kind tag in {:?}", raw)))?;

    if tag != kind.as_str() {
        return Err(TachyonError::Encoding(format!(
            "kind tag mismatch: stored {:?}, rule expects {:?}",
            tag,
            kind.as_str()
        )));
    }

    match kind {
        AggregateKind::Avg => {
            let (sum, count) = body.split_once(':').ok_or_else(|| {
                TachyonError::Encoding(format!("avg state missing count in {:?}", raw))
            })?;
            Ok(SlotState::Avg {
                sum: parse_f64(sum, raw)?,
                count: parse_u64(count, raw)?,
            })
        }
        AggregateKind::Sum => Ok(SlotState::Sum {
            sum: parse_f64(body, raw)?,
        }),
        AggregateKind::Min => Ok(SlotState::Min {
            min: parse_f64(body, raw)?,
        }),
        AggregateKind::Max => Ok(SlotState::Max {
            max: parse_f64(body, raw)?,
        }),
        AggregateKind::Last => {
            let (value, token) = body.split_once('@').ok_or_else(|| {
                TachyonError::Encoding(format!("last state missing token in {:?}", raw))
            })?;
            Ok(SlotState::Last {
                value: parse_f64(value, raw)?,
                token: token.parse::<i64>().map_err(|_| {
                    TachyonError::Encoding(format!("bad token in {:?}", raw))
                })?,
            })
        }
        AggregateKind::Count => Ok(SlotState::Count {
            count: parse_u64(body, raw)?,
        }),
        AggregateKind::Rate => Ok(SlotState::Rate {
            sum: parse_f64(body, raw)?,
        }),
    }
}

fn parse_f64(s: &str, raw: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| TachyonError::Encoding(format!("bad float {:?} in {:?}", s, raw)))
}

fn parse_u64(s: &str, raw: &str) -> Result<u64> {
    s.parse::<u64>()
        .map_err(|_| TachyonError::Encoding(format!("bad count {:?} in {:?}", s, raw)))
}

// =============================================================================
// Tests
// =============================================================================

//! Tachyon Error - Unified Error Types
//!
//! Error handling for all Tachyon operations. Registration errors are
//! rejected eagerly and never coerced; storage errors are surfaced verbatim
//! with no internal retry, because silently dropping a write would violate
//! the aggregation invariants.
//!
//! Key Features:
//! - Eager rule validation errors (InvalidRule)
//! - Per-sample timestamp rejection (InvalidTimestamp)
//! - Verbatim storage failures (StorageUnavailable)
//! - Corrupt slot payload detection (Encoding)
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Unified error type for all Tachyon operations.
#[derive(Error, Debug)]
pub enum TachyonError {
    /// Rule registration rejected: bad pattern, non-positive step or chunk
    /// size, or an unrecognized aggregation kind.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// A sample or query carried a timestamp outside the representable
    /// range (timestamps are non-negative Unix seconds).
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// The external key-value store was unreachable or timed out.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A read was issued against a rule id that was never registered.
    #[error("unknown rule id: {0}")]
    UnknownRule(u32),

    /// A stored slot payload could not be decoded back into a slot state.
    #[error("corrupt slot state: {0}")]
    Encoding(String),
}

impl TachyonError {
    /// Whether the error is a caller mistake rather than a system fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRule(_) | Self::InvalidTimestamp(_) | Self::UnknownRule(_)
        )
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

/// Result type alias for Tachyon operations.
pub type Result<T> = std::result::Result<T, TachyonError>;

// =============================================================================
// Tests
// =============================================================================

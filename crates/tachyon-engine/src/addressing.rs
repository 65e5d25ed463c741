//! Tachyon Addressing - Bin, Chunk and Slot Math
//!
//! Pure functions mapping a rule's binning parameters and a timestamp to
//! the physical location of its slot: bin = floor(ts / step), chunk =
//! floor(bin / chunk_size), slot = bin mod chunk_size. Stateless; negative
//! timestamps are rejected here so nothing downstream has to re-check.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use tachyon_common::{Result, Rule, TachyonError};

// =============================================================================
// Chunk Address
// =============================================================================

/// Physical location of one bin: which chunk key, and which field in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAddress {
    pub chunk_index: i64,
    pub slot_index: u32,
}

// =============================================================================
// Addressing Functions
// =============================================================================

/// Bin index for a timestamp under the rule's step.
pub fn bin_of(rule: &Rule, timestamp: i64) -> Result<i64> {
    if timestamp < 0 {
        return Err(TachyonError::InvalidTimestamp(timestamp));
    }
    Ok(timestamp / rule.step_seconds)
}

/// Address of a bin within the rule's chunk layout.
pub fn locate_bin(rule: &Rule, bin: i64) -> ChunkAddress {
    let chunk_size = rule.chunk_size as i64;
    ChunkAddress {
        chunk_index: bin / chunk_size,
        slot_index: (bin % chunk_size) as u32,
    }
}

/// Address of the slot a timestamp falls into.
pub fn locate(rule: &Rule, timestamp: i64) -> Result<ChunkAddress> {
    Ok(locate_bin(rule, bin_of(rule, timestamp)?))
}

/// Starting timestamp of a bin.
pub fn bin_start(rule: &Rule, bin: i64) -> i64 {
    bin * rule.step_seconds
}

// =============================================================================
// Tests
// =============================================================================

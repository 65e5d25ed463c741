//! Tachyon Types - Core Data Types
//!
//! Rules, samples, and aggregation kinds shared across the engine. A rule
//! binds a compiled name pattern to binning, chunking, retention, and
//! aggregation parameters; rules are immutable once constructed and are
//! identified by their insertion-order id.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use crate::config::MatchMode;
use crate::error::{Result, TachyonError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Rule Id
// =============================================================================

/// Insertion-order identifier of a registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Aggregate Kind
// =============================================================================

/// How multiple samples landing in the same bin are combined.
///
/// All kinds are associative and commutative so concurrent merges commute,
/// with the exception of `Last`, which instead carries an ordering token
/// inside the atomic merge so stale writes are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Avg,
    Sum,
    Min,
    Max,
    Last,
    Count,
    Rate,
}

impl AggregateKind {
    /// Stable textual tag, used both in rule lines and in the stored
    /// slot-state layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Last => "last",
            Self::Count => "count",
            Self::Rate => "rate",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateKind {
    type Err = TachyonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avg" => Ok(Self::Avg),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "last" => Ok(Self::Last),
            "count" => Ok(Self::Count),
            "rate" => Ok(Self::Rate),
            other => Err(TachyonError::InvalidRule(format!(
                "unknown aggregation kind: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Rule
// =============================================================================

/// A time series rule: every incoming sample whose name matches `pattern`
/// is binned, aggregated, and persisted according to these parameters.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Compiled, anchored pattern over series names.
    pattern: Regex,
    /// The pattern exactly as the caller supplied it.
    pattern_source: String,
    /// Logical field name for the series produced by this rule.
    pub field_name: String,
    /// Bin duration in seconds.
    pub step_seconds: i64,
    /// Number of bins stored under one external key.
    pub chunk_size: u32,
    /// Key TTL in seconds; 0 disables expiry entirely.
    pub retention_seconds: u64,
    /// Merge behavior for samples sharing a bin.
    pub kind: AggregateKind,
}

impl Rule {
    /// Build and validate a rule. The pattern is compiled once, anchored
    /// according to `mode`.
    pub fn new(
        pattern: &str,
        field_name: impl Into<String>,
        step_seconds: i64,
        chunk_size: u32,
        retention_seconds: u64,
        kind: AggregateKind,
        mode: MatchMode,
    ) -> Result<Self> {
        if step_seconds <= 0 {
            return Err(TachyonError::InvalidRule(format!(
                "step_seconds must be positive, got {}",
                step_seconds
            )));
        }
        if chunk_size == 0 {
            return Err(TachyonError::InvalidRule(
                "chunk_size must be positive".to_string(),
            ));
        }

        let anchored = match mode {
            MatchMode::FullString => format!("^(?:{})$", pattern),
            MatchMode::Prefix => format!("^(?:{})", pattern),
        };
        let compiled = Regex::new(&anchored)
            .map_err(|e| TachyonError::InvalidRule(format!("bad pattern {:?}: {}", pattern, e)))?;

        Ok(Self {
            pattern: compiled,
            pattern_source: pattern.to_string(),
            field_name: field_name.into(),
            step_seconds,
            chunk_size,
            retention_seconds,
            kind,
        })
    }

    /// Parse a rule from its one-line text form:
    /// `pattern field_name step chunk_size retention kind`.
    pub fn parse_line(line: &str, mode: MatchMode) -> Result<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 6 {
            return Err(TachyonError::InvalidRule(format!(
                "expected 6 fields (pattern field step chunk retention kind), got {}",
                parts.len()
            )));
        }

        let step = parts[2].parse::<i64>().map_err(|_| {
            TachyonError::InvalidRule(format!("bad step_seconds: {:?}", parts[2]))
        })?;
        let chunk = parts[3].parse::<u32>().map_err(|_| {
            TachyonError::InvalidRule(format!("bad chunk_size: {:?}", parts[3]))
        })?;
        let retention = parts[4].parse::<u64>().map_err(|_| {
            TachyonError::InvalidRule(format!("bad retention_seconds: {:?}", parts[4]))
        })?;
        let kind = parts[5].parse::<AggregateKind>()?;

        Self::new(parts[0], parts[1], step, chunk, retention, kind, mode)
    }

    /// Whether this rule applies to the given series name.
    pub fn matches(&self, series_name: &str) -> bool {
        self.pattern.is_match(series_name)
    }

    /// The pattern as originally supplied.
    pub fn pattern_source(&self) -> &str {
        &self.pattern_source
    }
}

// =============================================================================
// Sample
// =============================================================================

/// A single incoming measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub series_name: String,
    pub value: f64,
    /// Unix timestamp in whole seconds.
    pub timestamp: i64,
}

impl Sample {
    pub fn new(series_name: impl Into<String>, value: f64, timestamp: i64) -> Self {
        Self {
            series_name: series_name.into(),
            value,
            timestamp,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Tachyon Common - Shared Types and Utilities
//!
//! Foundational types, error handling, and configuration used across the
//! Tachyon time series aggregation engine. Provides the vocabulary shared
//! by the matcher, addressing, aggregation, and storage layers.
//!
//! Key Features:
//! - Unified error types with user/retryable classification
//! - Rule, sample, and aggregation-kind data types
//! - Engine configuration with pattern-matching mode selection
//!
//! @version 0.1.0
//! @author Tachyon Development Team

pub mod config;
pub mod error;
pub mod types;

pub use config::{EngineConfig, MatchMode};
pub use error::{Result, TachyonError};
pub use types::{AggregateKind, Rule, RuleId, Sample};

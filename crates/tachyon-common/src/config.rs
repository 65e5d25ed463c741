//! Tachyon Config - Configuration Structures
//!
//! Configuration for the aggregation engine. Supports programmatic
//! construction with sensible defaults; all fields serialize so deployments
//! can load them from their own config files.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use serde::{Deserialize, Serialize};

// =============================================================================
// Match Mode
// =============================================================================

/// How rule patterns are applied to series names.
///
/// Upstream systems disagree on whether a metric pattern should cover the
/// whole name or only its beginning, so both are supported; full-string is
/// the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The pattern must cover the entire series name.
    FullString,
    /// The pattern must match at the start of the series name.
    Prefix,
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prefix for every storage key this engine derives.
    pub key_prefix: String,
    /// Pattern application mode for all registered rules.
    pub match_mode: MatchMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_prefix: "ts".to_string(),
            match_mode: MatchMode::FullString,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.key_prefix, "ts");
        assert_eq!(config.match_mode, MatchMode::FullString);
    }
}

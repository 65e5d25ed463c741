//! Tachyon Matcher - Ordered Rule Dispatch
//!
//! Append-only rule registry evaluated in registration order. Every rule
//! whose pattern matches a series name applies independently, so one sample
//! may fan out into several stored series; a name matching nothing is
//! simply not stored. Pure lookup, no side effects.
//!
//! @version 0.1.0
//! @author Tachyon Development Team

use tachyon_common::{AggregateKind, MatchMode, Result, Rule, RuleId, TachyonError};

// =============================================================================
// Pattern Matcher
// =============================================================================

/// Ordered, append-only collection of rules with pattern dispatch.
pub struct PatternMatcher {
    rules: Vec<Rule>,
    mode: MatchMode,
}

impl PatternMatcher {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            rules: Vec::new(),
            mode,
        }
    }

    /// The pattern application mode rules are compiled with.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Validate, compile and append a rule, returning its id.
    pub fn register(
        &mut self,
        pattern: &str,
        field_name: &str,
        step_seconds: i64,
        chunk_size: u32,
        retention_seconds: u64,
        kind: AggregateKind,
    ) -> Result<RuleId> {
        let rule = Rule::new(
            pattern,
            field_name,
            step_seconds,
            chunk_size,
            retention_seconds,
            kind,
            self.mode,
        )?;
        Ok(self.insert(rule))
    }

    /// Append an already-built rule, returning its id.
    pub fn insert(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(rule);
        id
    }

    /// Look up a rule by id.
    pub fn get(&self, id: RuleId) -> Result<&Rule> {
        self.rules
            .get(id.0 as usize)
            .ok_or(TachyonError::UnknownRule(id.0))
    }

    /// All rules matching a series name, in registration order.
    pub fn matching(&self, series_name: &str) -> Vec<(RuleId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(series_name))
            .map(|(i, rule)| (RuleId(i as u32), rule))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

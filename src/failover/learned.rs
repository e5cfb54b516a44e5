//! Learned strategies and backup selection.
//!
//! # Responsibilities
//! - Keep the ordered list of strategies observed to work
//! - Select the next backup deterministically
//!
//! # Design Decisions
//! - Ordered sequence with de-duplication on insert, not a set: the
//!   front of the list is the most preferred backup
//! - Append-only; entries are never reordered

use serde::{Deserialize, Serialize};

use crate::failover::types::StrategyId;

/// Ordered, duplicate-free list of strategies that have worked before.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnedStrategies(Vec<StrategyId>);

impl LearnedStrategies {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `id` unless it is already known. Returns true if the list grew.
    pub fn learn(&mut self, id: &StrategyId) -> bool {
        if self.0.contains(id) {
            return false;
        }
        self.0.push(id.clone());
        true
    }

    /// First learned strategy that is not `current`.
    pub fn next_backup(&self, current: Option<&StrategyId>) -> Option<&StrategyId> {
        self.0.iter().find(|candidate| Some(*candidate) != current)
    }

    pub fn contains(&self, id: &StrategyId) -> bool {
        self.0.contains(id)
    }

    pub fn as_slice(&self) -> &[StrategyId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<StrategyId> for LearnedStrategies {
    /// Builds the list keeping the first occurrence of every id.
    fn from_iter<I: IntoIterator<Item = StrategyId>>(iter: I) -> Self {
        let mut learned = Self::new();
        for id in iter {
            learned.learn(&id);
        }
        learned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> LearnedStrategies {
        names.iter().map(|n| StrategyId::from(*n)).collect()
    }

    #[test]
    fn test_learn_appends_without_duplicates() {
        let mut learned = LearnedStrategies::new();
        assert!(learned.learn(&"a".into()));
        assert!(learned.learn(&"b".into()));
        assert!(!learned.learn(&"a".into()));
        assert_eq!(learned.as_slice(), &[StrategyId::from("a"), StrategyId::from("b")]);
    }

    #[test]
    fn test_from_iter_dedups_preserving_first() {
        let learned = ids(&["b", "a", "b", "c"]);
        let names: Vec<&str> = learned.as_slice().iter().map(StrategyId::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_next_backup_skips_current() {
        let learned = ids(&["a", "b", "c"]);
        assert_eq!(learned.next_backup(Some(&"a".into())), Some(&"b".into()));
        assert_eq!(learned.next_backup(Some(&"b".into())), Some(&"a".into()));
        assert_eq!(learned.next_backup(Some(&"z".into())), Some(&"a".into()));
        assert_eq!(learned.next_backup(None), Some(&"a".into()));
    }

    #[test]
    fn test_next_backup_never_equals_current() {
        let learned = ids(&["a"]);
        assert_eq!(learned.next_backup(Some(&"a".into())), None);
        assert_eq!(LearnedStrategies::new().next_backup(None), None);
    }

    #[test]
    fn test_selection_is_stable() {
        let learned = ids(&["a", "b", "c"]);
        let current = StrategyId::from("a");
        let first = learned.next_backup(Some(&current)).cloned();
        for _ in 0..5 {
            assert_eq!(learned.next_backup(Some(&current)).cloned(), first);
        }
    }
}

//! Short-term memory owned by a single engine.

use crate::pattern_table::PatternTable;
use bigroad_types::Outcome;
use serde::Serialize;
use std::collections::VecDeque;

/// FIFO log that evicts its oldest entry once `capacity` is reached.
#[derive(Clone, Debug)]
pub struct BoundedLog<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T: Copy> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<T> {
        self.items.back().copied()
    }

    /// Last `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<T> {
        self.items
            .iter()
            .skip(self.items.len().saturating_sub(n))
            .copied()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Running accuracy totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Predictions issued.
    pub predictions: u64,
    /// Correctness reports received.
    pub reported: u64,
    /// Reports that were correct.
    pub correct: u64,
}

impl EngineStats {
    pub fn accuracy_percent(&self) -> Option<u8> {
        if self.reported == 0 {
            return None;
        }
        Some(((self.correct * 100 + self.reported / 2) / self.reported).min(100) as u8)
    }
}

#[derive(Clone, Debug)]
pub struct EngineMemory {
    pub(crate) recent_predictions: BoundedLog<Outcome>,
    pub(crate) recent_correctness: BoundedLog<bool>,
    pub(crate) pattern_table: PatternTable,
    pub(crate) stats: EngineStats,
}

impl EngineMemory {
    pub fn new(prediction_capacity: usize, correctness_capacity: usize) -> Self {
        Self {
            recent_predictions: BoundedLog::new(prediction_capacity),
            recent_correctness: BoundedLog::new(correctness_capacity),
            pattern_table: PatternTable::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn recent_predictions(&self) -> &BoundedLog<Outcome> {
        &self.recent_predictions
    }

    pub fn recent_correctness(&self) -> &BoundedLog<bool> {
        &self.recent_correctness
    }

    pub fn pattern_table(&self) -> &PatternTable {
        &self.pattern_table
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub(crate) fn record_prediction(&mut self, outcome: Outcome) {
        self.recent_predictions.push(outcome);
        self.stats.predictions += 1;
    }

    pub(crate) fn record_correctness(&mut self, correct: bool) {
        self.recent_correctness.push(correct);
        self.stats.reported += 1;
        if correct {
            self.stats.correct += 1;
        }
    }

    /// True when at least `n` reports exist and the last `n` were all misses.
    pub fn recent_failures(&self, n: usize) -> bool {
        n > 0 && self.recent_correctness.len() >= n && self.recent_correctness.last_n(n).iter().all(|c| !c)
    }

    /// Whether issuing `candidate` would make three identical predictions in a row.
    pub fn would_triple(&self, candidate: Outcome) -> bool {
        let last_two = self.recent_predictions.last_n(2);
        last_two.len() == 2 && last_two.iter().all(|o| *o == candidate)
    }

    pub fn reset(&mut self) {
        self.recent_predictions.clear();
        self.recent_correctness.clear();
        self.pattern_table.clear();
        self.stats = EngineStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_log_evicts_oldest() {
        let mut log = BoundedLog::new(3);
        for i in 0..5 {
            log.push(i);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.last_n(10), vec![2, 3, 4]);
        assert_eq!(log.last_n(2), vec![3, 4]);
        assert_eq!(log.last(), Some(4));
    }

    #[test]
    fn test_recent_failures() {
        let mut memory = EngineMemory::new(20, 20);
        memory.record_correctness(false);
        memory.record_correctness(false);
        assert!(memory.recent_failures(2));
        assert!(!memory.recent_failures(3));
        memory.record_correctness(true);
        assert!(!memory.recent_failures(2));
        assert!(!memory.recent_failures(0));
    }

    #[test]
    fn test_would_triple() {
        let mut memory = EngineMemory::new(20, 20);
        memory.record_prediction(Outcome::Banker);
        assert!(!memory.would_triple(Outcome::Banker));
        memory.record_prediction(Outcome::Banker);
        assert!(memory.would_triple(Outcome::Banker));
        assert!(!memory.would_triple(Outcome::Player));
    }

    #[test]
    fn test_stats_and_reset() {
        let mut memory = EngineMemory::new(20, 20);
        memory.record_prediction(Outcome::Tie);
        memory.record_correctness(true);
        memory.record_correctness(false);
        memory.record_correctness(true);
        assert_eq!(memory.stats().accuracy_percent(), Some(67));

        memory.reset();
        assert!(memory.recent_predictions().is_empty());
        assert!(memory.recent_correctness().is_empty());
        assert_eq!(memory.stats(), EngineStats::default());
        assert_eq!(memory.stats().accuracy_percent(), None);
    }
}

//! Substring memory: what followed each short outcome pattern in the history.

use bigroad_types::Outcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Pattern lengths recorded in the table.
pub const PATTERN_LENGTHS: RangeInclusive<usize> = 3..=8;

/// Counts of the outcome that followed a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub banker: u32,
    pub player: u32,
    pub tie: u32,
}

impl FollowCounts {
    pub fn record(&mut self, next: Outcome) {
        let slot = match next {
            Outcome::Banker => &mut self.banker,
            Outcome::Player => &mut self.player,
            Outcome::Tie => &mut self.tie,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn get(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Banker => self.banker,
            Outcome::Player => self.player,
            Outcome::Tie => self.tie,
        }
    }

    pub fn total(&self) -> u32 {
        self.banker
            .saturating_add(self.player)
            .saturating_add(self.tie)
    }
}

/// Pattern → follow-count table.
///
/// Ordered map so that iteration (and anything derived from it) is deterministic.
#[derive(Clone, Debug, Default)]
pub struct PatternTable {
    entries: BTreeMap<Vec<Outcome>, FollowCounts>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the table and rescan `history`.
    ///
    /// Every substring of each recorded length that has a following hand is counted.
    pub fn rebuild(&mut self, history: &[Outcome]) {
        self.entries.clear();
        for len in PATTERN_LENGTHS {
            for start in 0..history.len().saturating_sub(len) {
                let next = history[start + len];
                self.entries
                    .entry(history[start..start + len].to_vec())
                    .or_default()
                    .record(next);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pattern: &[Outcome]) -> Option<&FollowCounts> {
        self.entries.get(pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[Outcome], &FollowCounts)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Entries for the trailing substrings of `history`, longest first.
    pub fn suffix_matches<'a>(
        &'a self,
        history: &'a [Outcome],
    ) -> impl Iterator<Item = (usize, &'a FollowCounts)> + 'a {
        PATTERN_LENGTHS
            .rev()
            .filter(move |len| history.len() >= *len)
            .filter_map(move |len| {
                self.get(&history[history.len() - len..])
                    .map(|counts| (len, counts))
            })
    }
}

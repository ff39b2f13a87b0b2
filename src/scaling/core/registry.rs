//! Identity-keyed legislator registry across periods.
//!
//! The multi-period bridger needs to know, for every stable legislator id,
//! which periods the legislator appears in and how many valid ballots they
//! cast there. Centralizing that join here replaces scattered per-period
//! list intersections with a single pass over the period matrices.
//!
//! Iteration order is deterministic (ids ascending), which keeps every
//! consumer reproducible for a fixed seed.
use std::collections::BTreeMap;

use crate::scaling::core::votes::{LegislatorId, RollCallMatrix};

/// One period's presence entry for a legislator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPresence {
    /// Position of the period in the input sequence.
    pub period_index: usize,
    /// Row of the legislator inside that period's matrix.
    pub row: usize,
    /// Valid (Yea/Nay) ballots cast in that period.
    pub valid_ballots: usize,
}

/// All periods one legislator appears in, ordered by period index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegislatorRecord {
    pub id: LegislatorId,
    pub presence: Vec<PeriodPresence>,
}

impl LegislatorRecord {
    /// Periods in which the legislator cast at least one valid ballot.
    pub fn active_periods(&self) -> impl Iterator<Item = &PeriodPresence> {
        self.presence.iter().filter(|p| p.valid_ballots > 0)
    }

    pub fn n_periods(&self) -> usize {
        self.presence.len()
    }
}

/// LegislatorRegistry — stable-id join across an ordered period sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegislatorRegistry {
    records: BTreeMap<LegislatorId, LegislatorRecord>,
}

impl LegislatorRegistry {
    /// Build the registry from period matrices, in input order.
    pub fn from_periods(matrices: &[RollCallMatrix]) -> Self {
        let mut records: BTreeMap<LegislatorId, LegislatorRecord> = BTreeMap::new();
        for (period_index, matrix) in matrices.iter().enumerate() {
            for (row, &id) in matrix.legislators().iter().enumerate() {
                let entry = records
                    .entry(id)
                    .or_insert_with(|| LegislatorRecord { id, presence: Vec::new() });
                entry.presence.push(PeriodPresence {
                    period_index,
                    row,
                    valid_ballots: matrix.valid_ballots_in_row(row),
                });
            }
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: LegislatorId) -> Option<&LegislatorRecord> {
        self.records.get(&id)
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &LegislatorRecord> {
        self.records.values()
    }

    /// Ids of legislators present in every one of `n_periods` periods.
    pub fn present_in_all(&self, n_periods: usize) -> Vec<LegislatorId> {
        self.records
            .values()
            .filter(|r| r.n_periods() == n_periods)
            .map(|r| r.id)
            .collect()
    }
}

//! Roll-call primitives: legislator and vote identifiers, ballot choices,
//! and the validated per-period [`RollCallMatrix`].
//!
//! Purpose
//! -------
//! Provide the immutable data container every other scaling component
//! consumes. A matrix is built once per period by the (external) extraction
//! pipeline, validated on construction, and never mutated afterwards; the
//! estimator, bridger, and polarity passes all read through this type.
//!
//! Invariants & assumptions
//! ------------------------
//! - Legislator and vote ids are unique within a period; legislator ids are
//!   additionally stable across periods (the bridger keys on them).
//! - The choice grid is rectangular: `legislators.len() x votes.len()`, rows
//!   indexed by legislator, columns by vote.
//! - Only [`VoteChoice::Yea`] and [`VoteChoice::Nay`] are *valid* ballots;
//!   abstentions, absences, and missing cells never enter any likelihood.
//!
//! Downstream usage
//! ----------------
//! - `core::filter` consumes a matrix and produces a filtered copy plus
//!   exclusion records.
//! - `core::init` and the model half-steps read rows/columns through the
//!   accessors here; nothing outside this module touches the raw grid.
use std::collections::HashSet;

use ndarray::{Array2, ArrayView1};

use crate::scaling::errors::{ScalingError, ScalingResult};

/// Stable identifier for one legislator, unique across all periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegislatorId(pub u64);

impl std::fmt::Display for LegislatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Identifier for one recorded roll call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoteId(pub u64);

impl std::fmt::Display for VoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// One legislator's recorded choice on one roll call.
///
/// `Absent` covers abstention and not-in-legislature alike; the distinction
/// never matters to estimation because neither contributes to the
/// likelihood. `Missing` marks cells the extraction pipeline could not
/// resolve at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    Yea,
    Nay,
    Absent,
    Missing,
}

impl VoteChoice {
    /// Whether this choice contributes to the likelihood.
    pub fn is_valid(self) -> bool {
        matches!(self, VoteChoice::Yea | VoteChoice::Nay)
    }
}

/// RollCallMatrix — one period's legislator-by-vote choice grid.
///
/// Construction validates id uniqueness and grid shape; accessors expose
/// rows, columns, and valid-ballot counts. The container is immutable after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RollCallMatrix {
    period: usize,
    legislators: Vec<LegislatorId>,
    votes: Vec<VoteId>,
    choices: Array2<VoteChoice>,
}

impl RollCallMatrix {
    /// Build a validated matrix for one period.
    ///
    /// # Errors
    /// - [`ScalingError::EmptyMatrix`] when either id list is empty.
    /// - [`ScalingError::DuplicateLegislator`] / [`ScalingError::DuplicateVote`]
    ///   for repeated ids.
    /// - [`ScalingError::ChoiceShapeMismatch`] when the grid does not match
    ///   the id lists.
    pub fn new(
        period: usize, legislators: Vec<LegislatorId>, votes: Vec<VoteId>,
        choices: Array2<VoteChoice>,
    ) -> ScalingResult<Self> {
        if legislators.is_empty() || votes.is_empty() {
            return Err(ScalingError::EmptyMatrix { period });
        }
        let mut seen_legislators = HashSet::with_capacity(legislators.len());
        for &id in &legislators {
            if !seen_legislators.insert(id) {
                return Err(ScalingError::DuplicateLegislator { id, period });
            }
        }
        let mut seen_votes = HashSet::with_capacity(votes.len());
        for &id in &votes {
            if !seen_votes.insert(id) {
                return Err(ScalingError::DuplicateVote { id, period });
            }
        }
        let (rows, cols) = choices.dim();
        if rows != legislators.len() || cols != votes.len() {
            return Err(ScalingError::ChoiceShapeMismatch {
                period,
                rows,
                cols,
                legislators: legislators.len(),
                votes: votes.len(),
            });
        }
        Ok(Self { period, legislators, votes, choices })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn n_legislators(&self) -> usize {
        self.legislators.len()
    }

    pub fn n_votes(&self) -> usize {
        self.votes.len()
    }

    pub fn legislators(&self) -> &[LegislatorId] {
        &self.legislators
    }

    pub fn votes(&self) -> &[VoteId] {
        &self.votes
    }

    /// Row index of a legislator id, if present this period.
    pub fn row_of(&self, id: LegislatorId) -> Option<usize> {
        self.legislators.iter().position(|&l| l == id)
    }

    /// The full choice row for legislator `row`.
    pub fn row(&self, row: usize) -> ArrayView1<'_, VoteChoice> {
        self.choices.row(row)
    }

    /// The full choice column for vote `col`.
    pub fn column(&self, col: usize) -> ArrayView1<'_, VoteChoice> {
        self.choices.column(col)
    }

    pub fn choice(&self, row: usize, col: usize) -> VoteChoice {
        self.choices[(row, col)]
    }

    /// Number of valid (Yea/Nay) ballots cast by legislator `row`.
    pub fn valid_ballots_in_row(&self, row: usize) -> usize {
        self.choices.row(row).iter().filter(|c| c.is_valid()).count()
    }

    /// Yea and Nay counts for vote `col`.
    pub fn tallies_in_column(&self, col: usize) -> (usize, usize) {
        let mut yea = 0;
        let mut nay = 0;
        for choice in self.choices.column(col) {
            match choice {
                VoteChoice::Yea => yea += 1,
                VoteChoice::Nay => nay += 1,
                _ => {}
            }
        }
        (yea, nay)
    }

    /// Build a sub-matrix restricted to the given row and column indices.
    ///
    /// Index order is preserved; callers pass already-deduplicated,
    /// in-range indices (this is an internal filtering aid).
    pub(crate) fn select(&self, rows: &[usize], cols: &[usize]) -> ScalingResult<Self> {
        let legislators: Vec<LegislatorId> = rows.iter().map(|&r| self.legislators[r]).collect();
        let votes: Vec<VoteId> = cols.iter().map(|&c| self.votes[c]).collect();
        let choices = Array2::from_shape_fn((rows.len(), cols.len()), |(i, j)| {
            self.choices[(rows[i], cols[j])]
        });
        Self::new(self.period, legislators, votes, choices)
    }
}

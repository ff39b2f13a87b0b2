//! Preprocessing filters: lopsided-vote and minimum-ballot screens.
//!
//! Purpose
//! -------
//! Drop roll calls whose minority side is too small to discriminate and
//! legislators with too few valid ballots to place, recording an
//! [`Exclusion`] for every dropped row or column so results can report who
//! was removed and why. Also performs the post-filter estimability checks
//! (enough rows/columns for the requested dimensionality; no unanimous
//! columns left behind).
//!
//! Key behaviors
//! -------------
//! - Vote screen first: a column is dropped when it has no valid ballots or
//!   its minority count falls below `lop` of valid ballots. Raising `lop`
//!   can only drop more columns (monotone).
//! - Legislator screen second, against the retained columns: a row is
//!   dropped when its valid-ballot count falls below `minvotes`. Raising
//!   `minvotes` can only drop more rows (monotone).
//! - Screens run once, in that order; the survivors form the estimation
//!   matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - With `lop > 0` no unanimous column can survive; a surviving unanimous
//!   column (possible only at `lop == 0`) is reported as degeneracy by
//!   [`ensure_estimable`], not silently tolerated.
use crate::scaling::core::votes::{LegislatorId, RollCallMatrix, VoteId};
use crate::scaling::errors::{ScalingError, ScalingResult};

/// A dropped row or column, with the numbers that triggered the drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Lopsided (or empty) roll call: minority side below the threshold.
    Vote { vote: VoteId, period: usize, minority: usize, valid: usize },
    /// Legislator with too few valid ballots.
    Legislator { legislator: LegislatorId, period: usize, valid: usize, required: usize },
}

/// Filter output: the retained sub-matrix plus exclusion records.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredMatrix {
    pub matrix: RollCallMatrix,
    pub exclusions: Vec<Exclusion>,
}

/// Apply the lopsided-vote and minimum-ballot screens to one period.
///
/// # Errors
/// - [`ScalingError::TooFewVotes`] / [`ScalingError::TooFewLegislators`]
///   when a screen leaves nothing to re-assemble (the stricter
///   dimensionality check happens later in [`ensure_estimable`]).
pub fn filter_matrix(
    matrix: &RollCallMatrix, minvotes: usize, lop: f64,
) -> ScalingResult<FilteredMatrix> {
    let period = matrix.period();
    let mut exclusions = Vec::new();

    // Vote screen.
    let mut kept_cols = Vec::with_capacity(matrix.n_votes());
    for col in 0..matrix.n_votes() {
        let (yea, nay) = matrix.tallies_in_column(col);
        let valid = yea + nay;
        let minority = yea.min(nay);
        if valid == 0 || (minority as f64) < lop * (valid as f64) {
            exclusions.push(Exclusion::Vote { vote: matrix.votes()[col], period, minority, valid });
        } else {
            kept_cols.push(col);
        }
    }
    if kept_cols.is_empty() {
        return Err(ScalingError::TooFewVotes { remaining: 0, required: 1 });
    }

    // Legislator screen, against the retained columns.
    let mut kept_rows = Vec::with_capacity(matrix.n_legislators());
    for row in 0..matrix.n_legislators() {
        let valid = kept_cols.iter().filter(|&&col| matrix.choice(row, col).is_valid()).count();
        if valid < minvotes {
            exclusions.push(Exclusion::Legislator {
                legislator: matrix.legislators()[row],
                period,
                valid,
                required: minvotes,
            });
        } else {
            kept_rows.push(row);
        }
    }
    if kept_rows.is_empty() {
        return Err(ScalingError::TooFewLegislators { remaining: 0, required: 1 });
    }

    let matrix = matrix.select(&kept_rows, &kept_cols)?;
    Ok(FilteredMatrix { matrix, exclusions })
}

/// Post-filter estimability checks for a `dims`-dimensional fit.
///
/// # Errors
/// - [`ScalingError::TooFewLegislators`] / [`ScalingError::TooFewVotes`]
///   when fewer than `dims + 2` rows or columns remain.
/// - [`ScalingError::DegenerateVote`] when a unanimous column survived the
///   vote screen (only possible with `lop == 0`).
pub fn ensure_estimable(matrix: &RollCallMatrix, dims: usize) -> ScalingResult<()> {
    let required = dims + 2;
    if matrix.n_legislators() < required {
        return Err(ScalingError::TooFewLegislators {
            remaining: matrix.n_legislators(),
            required,
        });
    }
    if matrix.n_votes() < required {
        return Err(ScalingError::TooFewVotes { remaining: matrix.n_votes(), required });
    }
    for col in 0..matrix.n_votes() {
        let (yea, nay) = matrix.tallies_in_column(col);
        if yea.min(nay) == 0 {
            return Err(ScalingError::DegenerateVote {
                vote: matrix.votes()[col],
                period: matrix.period(),
            });
        }
    }
    Ok(())
}

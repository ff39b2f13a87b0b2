//! Errors for roll-call scaling (input validation, data sufficiency,
//! anchor resolution, and numerical degeneracy).
//!
//! This module defines the unified error type [`ScalingError`] used across
//! the estimator, the multi-period bridger, and the polarity passes.
//!
//! ## Conventions
//! - **Indices are 0-based**; periods are addressed by their position in the
//!   input sequence.
//! - Input-validation and insufficiency errors abort the whole estimation.
//! - A missing polarity anchor is *recoverable*: resolution falls back to the
//!   row-based policy with a warning, and [`ScalingError::AnchorNotFound`] is
//!   only surfaced by the strict resolution helper.
//! - Failure to converge is never an error; results carry a convergence flag.
use crate::optimization::errors::OptError;
use crate::scaling::core::votes::{LegislatorId, VoteId};

/// Crate-wide result alias for scaling operations.
pub type ScalingResult<T> = Result<T, ScalingError>;

/// Unified error type for ideal-point estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalingError {
    // ---- Input validation ----
    /// A roll-call matrix has no legislators or no votes.
    EmptyMatrix { period: usize },

    /// The same legislator id appears twice in one period.
    DuplicateLegislator { id: LegislatorId, period: usize },

    /// The same vote id appears twice in one period.
    DuplicateVote { id: VoteId, period: usize },

    /// The choice grid does not match the id lists.
    ChoiceShapeMismatch { period: usize, rows: usize, cols: usize, legislators: usize, votes: usize },

    /// Periods must be supplied in strictly increasing order.
    PeriodsUnordered { index: usize, previous: usize, current: usize },

    /// Requested dimensionality must be at least 1.
    InvalidDims { dims: usize },

    /// Lopsided-vote threshold must lie in [0, 0.5).
    InvalidLop { lop: f64 },

    /// At least one trial is required.
    InvalidTrials { trials: usize },

    /// Convergence tolerance must be finite and strictly positive.
    InvalidTolerance { tolerance: f64 },

    /// Sweep budget must be at least 1.
    InvalidMaxSweeps { sweeps: usize },

    /// Weight-update interval must be at least 1.
    InvalidWeightInterval { interval: usize },

    /// Polynomial model order must lie in 0..=3.
    InvalidModelOrder { order: usize },

    /// More anchor pairs than dimensions were supplied.
    TooManyAnchorPairs { pairs: usize, dims: usize },

    /// A dimension index is outside the fitted dimensionality.
    DimensionOutOfRange { dimension: usize, dims: usize },

    // ---- Insufficient data ----
    /// Fewer than `required` legislators survive filtering.
    TooFewLegislators { remaining: usize, required: usize },

    /// Fewer than `required` votes survive filtering.
    TooFewVotes { remaining: usize, required: usize },

    /// Too few periods for the requested polynomial order.
    TooFewPeriods { periods: usize, required: usize, order: usize },

    // ---- Anchor resolution ----
    /// A named polarity anchor is absent from the filtered data.
    AnchorNotFound { id: LegislatorId },

    // ---- Numerical degeneracy ----
    /// A unanimous vote survived filtering; the column cannot discriminate.
    DegenerateVote { vote: VoteId, period: usize },

    /// The trajectory normal equations are singular for a legislator.
    SingularTrajectoryFit { legislator: LegislatorId },

    /// An aggregate log-likelihood evaluated to a non-finite value.
    NonFiniteLogLikelihood { value: f64 },

    // ---- Optimizer bridge ----
    /// A solver failure that the half-step fallback could not absorb.
    Optimization { source: OptError },
}

impl std::error::Error for ScalingError {}

impl std::fmt::Display for ScalingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input validation ----
            ScalingError::EmptyMatrix { period } => {
                write!(f, "Roll-call matrix for period {period} has no legislators or no votes")
            }
            ScalingError::DuplicateLegislator { id, period } => {
                write!(f, "Duplicate legislator id {id} in period {period}")
            }
            ScalingError::DuplicateVote { id, period } => {
                write!(f, "Duplicate vote id {id} in period {period}")
            }
            ScalingError::ChoiceShapeMismatch { period, rows, cols, legislators, votes } => {
                write!(
                    f,
                    "Choice grid for period {period} is {rows}x{cols} but {legislators} \
                     legislators and {votes} votes were supplied"
                )
            }
            ScalingError::PeriodsUnordered { index, previous, current } => {
                write!(
                    f,
                    "Periods must be strictly increasing: index {index} has period {current} \
                     after {previous}"
                )
            }
            ScalingError::InvalidDims { dims } => {
                write!(f, "Invalid dimensionality {dims}: must be at least 1")
            }
            ScalingError::InvalidLop { lop } => {
                write!(f, "Invalid lopsided threshold {lop}: must lie in [0, 0.5)")
            }
            ScalingError::InvalidTrials { trials } => {
                write!(f, "Invalid trial count {trials}: must be at least 1")
            }
            ScalingError::InvalidTolerance { tolerance } => {
                write!(f, "Invalid tolerance {tolerance}: must be finite and > 0")
            }
            ScalingError::InvalidMaxSweeps { sweeps } => {
                write!(f, "Invalid sweep budget {sweeps}: must be at least 1")
            }
            ScalingError::InvalidWeightInterval { interval } => {
                write!(f, "Invalid weight-update interval {interval}: must be at least 1")
            }
            ScalingError::InvalidModelOrder { order } => {
                write!(f, "Invalid model order {order}: must lie in 0..=3")
            }
            ScalingError::TooManyAnchorPairs { pairs, dims } => {
                write!(f, "{pairs} anchor pairs supplied for {dims} dimensions")
            }
            ScalingError::DimensionOutOfRange { dimension, dims } => {
                write!(f, "Dimension {dimension} is out of range for a {dims}-dimensional fit")
            }

            // ---- Insufficient data ----
            ScalingError::TooFewLegislators { remaining, required } => {
                write!(
                    f,
                    "Insufficient data: {remaining} legislators remain after filtering, \
                     {required} required"
                )
            }
            ScalingError::TooFewVotes { remaining, required } => {
                write!(
                    f,
                    "Insufficient data: {remaining} votes remain after filtering, \
                     {required} required"
                )
            }
            ScalingError::TooFewPeriods { periods, required, order } => {
                write!(
                    f,
                    "Insufficient data: model order {order} needs {required} periods, \
                     {periods} supplied"
                )
            }

            // ---- Anchor resolution ----
            ScalingError::AnchorNotFound { id } => {
                write!(f, "Polarity anchor {id} is absent from the filtered data")
            }

            // ---- Numerical degeneracy ----
            ScalingError::DegenerateVote { vote, period } => {
                write!(f, "Vote {vote} in period {period} is unanimous after filtering")
            }
            ScalingError::SingularTrajectoryFit { legislator } => {
                write!(f, "Singular trajectory fit for legislator {legislator}")
            }
            ScalingError::NonFiniteLogLikelihood { value } => {
                write!(f, "Aggregate log-likelihood is non-finite: {value}")
            }

            // ---- Optimizer bridge ----
            ScalingError::Optimization { source } => {
                write!(f, "Optimizer failure: {source}")
            }
        }
    }
}

impl From<OptError> for ScalingError {
    fn from(source: OptError) -> Self {
        ScalingError::Optimization { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Display formatting of representative variants from each section.
    // - The OptError -> ScalingError conversion.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure insufficiency messages carry both the observed and required
    // counts so callers can report exclusions meaningfully.
    //
    // Given
    // -----
    // - TooFewLegislators { remaining: 3, required: 4 }.
    //
    // Expect
    // ------
    // - The message contains "3" and "4".
    fn too_few_legislators_display_carries_counts() {
        let err = ScalingError::TooFewLegislators { remaining: 3, required: 4 };
        let text = err.to_string();
        assert!(text.contains('3') && text.contains('4'), "message was: {text}");
    }

    #[test]
    // Purpose
    // -------
    // Verify optimizer failures wrap rather than erase their source.
    //
    // Given
    // -----
    // - An OptError::MissingBestParam converted via From.
    //
    // Expect
    // ------
    // - The ScalingError is the Optimization variant holding that source.
    fn opt_error_converts_to_optimization_variant() {
        let err: ScalingError = OptError::MissingBestParam.into();
        match err {
            ScalingError::Optimization { source } => {
                assert_eq!(source, OptError::MissingBestParam);
            }
            other => panic!("expected Optimization variant, got {:?}", other),
        }
    }
}

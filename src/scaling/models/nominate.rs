//! The single-period alternating estimator.
//!
//! Purpose
//! -------
//! Run one trial of the alternating maximum-likelihood estimation on a
//! filtered roll-call matrix: a parallel bill step, a parallel legislator
//! step, a periodic joint re-optimization of β and the dimension weights,
//! and a convergence check on the aggregate log-likelihood. Also resolve
//! the polarity-anchor policy into concrete row pairs and apply the
//! anchor-based sign fix to a finished configuration.
//!
//! Key behaviors
//! -------------
//! - Each sweep is bill step -> barrier -> legislator step -> (periodic)
//!   β/w line searches -> log-likelihood. The barrier between half-steps
//!   comes from collecting the parallel map before positions move.
//! - Sweeps stop when the log-likelihood increase falls below the
//!   tolerance or the sweep budget is exhausted; the trial records which.
//! - Anchor resolution happens once, before estimation: named pairs that
//!   survive filtering are kept, anything else falls back to the row
//!   policy (first retained row negative, last retained row positive) with
//!   a warning.
//!
//! Invariants & assumptions
//! ------------------------
//! - The input matrix has already been filtered and passed
//!   `ensure_estimable`; every column splits and every row has ballots.
//! - The sweep objective is non-decreasing: both half-steps keep their
//!   incumbents on failure, and the β/w update only accepts improvements.
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::optimization::loglik::StepOptions;
use crate::optimization::scalar::maximize_on_interval;
use crate::scaling::core::likelihood::matrix_log_likelihood;
use crate::scaling::core::options::{AnchorPolicy, ScalingOptions};
use crate::scaling::core::params::BillPoints;
use crate::scaling::core::votes::RollCallMatrix;
use crate::scaling::core::weights::{ModelWeights, BETA_BOUNDS, WEIGHT_BOUNDS};
use crate::scaling::errors::{ScalingError, ScalingResult};
use crate::scaling::models::steps::{fit_bill, fit_legislator, initial_bill_points};

/// One finished trial: the configuration plus its diagnostic trace.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrialRun {
    pub positions: Array2<f64>,
    pub bills: Vec<BillPoints>,
    pub weights: ModelWeights,
    /// Aggregate log-likelihood after every sweep.
    pub trace: Vec<f64>,
    pub converged: bool,
    pub sweeps: usize,
    pub log_likelihood: f64,
}

/// Anchor pairs resolved to row indices, one slot per dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedAnchors {
    /// (negative row, positive row) per dimension; `None` leaves the
    /// dimension's sign to the optimizer.
    pub pairs: Vec<Option<(usize, usize)>>,
    /// Whether any named anchor was missing and replaced by row fallback.
    pub fallback_used: bool,
}

/// Resolve the anchor policy against the filtered matrix.
///
/// Missing named anchors are recoverable: the affected dimension falls
/// back to the row policy with a warning rather than failing the run.
pub(crate) fn resolve_anchors(
    policy: &AnchorPolicy, matrix: &RollCallMatrix, dims: usize,
) -> ResolvedAnchors {
    let last = matrix.n_legislators() - 1;
    match policy {
        AnchorPolicy::RowFallback => ResolvedAnchors {
            pairs: vec![Some((0, last)); dims],
            fallback_used: false,
        },
        AnchorPolicy::Pairs(pairs) => {
            let mut resolved = vec![None; dims];
            let mut fallback_used = false;
            for (dim, pair) in pairs.iter().enumerate() {
                match lookup_pair(matrix, pair.negative, pair.positive) {
                    Ok(rows) => resolved[dim] = Some(rows),
                    Err(ScalingError::AnchorNotFound { id }) => {
                        log::warn!(
                            "anchor {id} for dimension {dim} was filtered out; \
                             falling back to row anchors"
                        );
                        resolved[dim] = Some((0, last));
                        fallback_used = true;
                    }
                    Err(_) => unreachable!("lookup_pair only reports AnchorNotFound"),
                }
            }
            ResolvedAnchors { pairs: resolved, fallback_used }
        }
    }
}

/// Strict lookup of an anchor pair's rows.
fn lookup_pair(
    matrix: &RollCallMatrix, negative: crate::scaling::core::votes::LegislatorId,
    positive: crate::scaling::core::votes::LegislatorId,
) -> ScalingResult<(usize, usize)> {
    let neg = matrix.row_of(negative).ok_or(ScalingError::AnchorNotFound { id: negative })?;
    let pos = matrix.row_of(positive).ok_or(ScalingError::AnchorNotFound { id: positive })?;
    Ok((neg, pos))
}

/// Flip every anchored dimension whose negative anchor does not sit
/// strictly below its positive anchor. Returns the per-dimension flip
/// decisions.
pub(crate) fn apply_anchor_orientation(
    positions: &mut Array2<f64>, bills: &mut [BillPoints], anchors: &ResolvedAnchors,
) -> Vec<bool> {
    let mut flips = vec![false; anchors.pairs.len()];
    for (dim, pair) in anchors.pairs.iter().enumerate() {
        let Some((neg_row, pos_row)) = *pair else { continue };
        if positions[(neg_row, dim)] >= positions[(pos_row, dim)] {
            flips[dim] = true;
            for row in 0..positions.nrows() {
                positions[(row, dim)] = -positions[(row, dim)];
            }
            for bill in bills.iter_mut() {
                bill.flip_dimension(dim);
            }
        }
    }
    flips
}

/// Run one trial of the alternating optimization from a given start.
///
/// # Errors
/// - [`ScalingError::NonFiniteLogLikelihood`] if an aggregate evaluation
///   degenerates (indicates corrupt inputs; the clamped likelihood cannot
///   produce this from finite data).
pub(crate) fn run_trial(
    matrix: &RollCallMatrix, start: Array2<f64>, opts: &ScalingOptions, step_opts: &StepOptions,
) -> ScalingResult<TrialRun> {
    let n_votes = matrix.n_votes();
    let n_legislators = matrix.n_legislators();
    let mut positions = start;
    let mut weights = ModelWeights::start(opts.dims);
    let mut bills: Vec<BillPoints> =
        (0..n_votes).map(|col| initial_bill_points(matrix, &positions, col)).collect();

    let mut trace = Vec::with_capacity(opts.max_sweeps);
    let mut converged = false;
    let mut previous = f64::NEG_INFINITY;

    for sweep in 0..opts.max_sweeps {
        // Bill step: independent per column. The collect is the barrier;
        // no legislator update sees half-updated bill points.
        bills = (0..n_votes)
            .into_par_iter()
            .map(|col| fit_bill(&positions, matrix.column(col), &weights, &bills[col], step_opts))
            .collect();

        // Legislator step: independent per row.
        let rows: Vec<Array1<f64>> = (0..n_legislators)
            .into_par_iter()
            .map(|row| {
                fit_legislator(&bills, matrix.row(row), &weights, positions.row(row), step_opts)
            })
            .collect();
        for (row, coords) in rows.into_iter().enumerate() {
            positions.row_mut(row).assign(&coords);
        }

        // Periodic joint re-optimization of beta and the free weights.
        if (sweep + 1) % opts.weight_update_interval == 0 {
            update_weights(matrix, &positions, &bills, &mut weights);
        }

        let loglik = matrix_log_likelihood(matrix, &positions, &bills, &weights);
        if !loglik.is_finite() {
            return Err(ScalingError::NonFiniteLogLikelihood { value: loglik });
        }
        trace.push(loglik);

        if sweep > 0 && loglik - previous < opts.tolerance {
            converged = true;
            previous = loglik;
            break;
        }
        previous = loglik;
    }

    Ok(TrialRun {
        positions,
        bills,
        weights,
        converged,
        sweeps: trace.len(),
        log_likelihood: previous,
        trace,
    })
}

/// Bounded line searches for β and each free dimension weight, accepting
/// only strict improvements of the aggregate log-likelihood.
fn update_weights(
    matrix: &RollCallMatrix, positions: &Array2<f64>, bills: &[BillPoints],
    weights: &mut ModelWeights,
) {
    let mut current = matrix_log_likelihood(matrix, positions, bills, weights);

    let beta_objective = |beta: f64| {
        let mut candidate = weights.clone();
        candidate.set_beta(beta);
        matrix_log_likelihood(matrix, positions, bills, &candidate)
    };
    match maximize_on_interval(&beta_objective, BETA_BOUNDS.0, BETA_BOUNDS.1, weights.beta()) {
        Ok(beta_hat) => {
            let improved = beta_objective(beta_hat);
            if improved > current {
                weights.set_beta(beta_hat);
                current = improved;
            }
        }
        Err(err) => log::debug!("beta line search kept incumbent: {err}"),
    }

    for dim in 1..weights.dims() {
        let weight_objective = |w: f64| {
            let mut candidate = weights.clone();
            candidate.set_weight(dim, w);
            matrix_log_likelihood(matrix, positions, bills, &candidate)
        };
        match maximize_on_interval(
            &weight_objective,
            WEIGHT_BOUNDS.0,
            WEIGHT_BOUNDS.1,
            weights.weights()[dim],
        ) {
            Ok(w_hat) => {
                let improved = weight_objective(w_hat);
                if improved > current {
                    weights.set_weight(dim, w_hat);
                    current = improved;
                }
            }
            Err(err) => log::debug!("weight line search kept incumbent: {err}"),
        }
    }
}

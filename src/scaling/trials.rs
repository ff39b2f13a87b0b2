//! Trial controller: seeded restarts, selection, and result assembly.
//!
//! Purpose
//! -------
//! Drive the full single-period pipeline: filtering, estimability checks,
//! anchor resolution, the spectral start, `trials` independent restarts of
//! the alternating optimization, an exact max-reduction over the finished
//! trials, the anchor-based sign fix, and assembly of the public
//! [`NominateFit`].
//!
//! Key behaviors
//! -------------
//! - Trial 0 starts from the unperturbed spectral configuration; trial k
//!   perturbs it with an RNG seeded at `seed + k`, so a fixed seed makes
//!   the whole run reproducible.
//! - Trials run as a parallel map with no shared mutable state; selection
//!   is a pure reduction under a total order (higher log-likelihood, then
//!   fewer sweeps, then lower trial index), so the winner does not depend
//!   on scheduling.
//! - Every trial's summary is reported, and the winner's full per-sweep
//!   trace is exposed for convergence debugging.
//! - Failure semantics follow the estimation contract: filtering and
//!   degeneracy problems abort with typed errors; a trial that merely
//!   fails to converge still yields its best-so-far state with the
//!   convergence flag unset.
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::optimization::loglik::StepOptions;
use crate::scaling::core::filter::{ensure_estimable, filter_matrix, Exclusion};
use crate::scaling::core::init::{perturb_start, spectral_start};
use crate::scaling::core::options::ScalingOptions;
use crate::scaling::core::params::{BillPoints, IdealPoint};
use crate::scaling::core::stats::{fit_stats, FitStats};
use crate::scaling::core::votes::RollCallMatrix;
use crate::scaling::core::weights::ModelWeights;
use crate::scaling::errors::ScalingResult;
use crate::scaling::models::nominate::{
    apply_anchor_orientation, resolve_anchors, run_trial, TrialRun,
};

/// Outcome summary of one restart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSummary {
    pub trial: usize,
    pub seed: u64,
    pub log_likelihood: f64,
    pub sweeps: usize,
    pub converged: bool,
}

/// NominateFit — the full result of one single-period estimation.
///
/// Everything the exporter consumes: per-legislator ideal points, fitted
/// bill reference points, the shared β / dimension weights, fit statistics,
/// convergence diagnostics, the winning trial's per-sweep trace, every
/// trial's summary, and the exclusion list from preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct NominateFit {
    pub points: Vec<IdealPoint>,
    pub bills: Vec<BillPoints>,
    pub weights: ModelWeights,
    pub stats: FitStats,
    pub converged: bool,
    pub sweeps: usize,
    /// Aggregate log-likelihood after each sweep of the winning trial.
    pub trace: Vec<f64>,
    pub trials: Vec<TrialSummary>,
    pub winning_trial: usize,
    /// Dimensions flipped by the anchor-based sign fix.
    pub flipped_dimensions: Vec<bool>,
    /// Whether any named anchor was missing and replaced by row fallback.
    pub anchor_fallback: bool,
    pub exclusions: Vec<Exclusion>,
}

/// Estimate ideal points for one period.
///
/// This is the public entry point for single-period estimation; see the
/// module documentation for the pipeline stages.
///
/// # Errors
/// - Filtering/estimability failures ([`crate::scaling::errors::ScalingError`]
///   input, insufficiency, and degeneracy variants) abort the run.
/// - Non-convergence is *not* an error: the best-so-far configuration is
///   returned with `converged == false`.
pub fn estimate(matrix: &RollCallMatrix, opts: &ScalingOptions) -> ScalingResult<NominateFit> {
    let filtered = filter_matrix(matrix, opts.minvotes, opts.lop)?;
    ensure_estimable(&filtered.matrix, opts.dims)?;
    for exclusion in &filtered.exclusions {
        match exclusion {
            Exclusion::Vote { vote, minority, valid, .. } => {
                log::debug!("excluded vote {vote}: minority {minority} of {valid} valid ballots");
            }
            Exclusion::Legislator { legislator, valid, required, .. } => {
                log::debug!(
                    "excluded legislator {legislator}: {valid} valid ballots, {required} required"
                );
            }
        }
    }

    let anchors = resolve_anchors(&opts.anchors, &filtered.matrix, opts.dims);
    let base_start = spectral_start(&filtered.matrix, opts.dims)?;
    let step_opts = StepOptions::default();

    let runs: Vec<ScalingResult<TrialRun>> = (0..opts.trials)
        .into_par_iter()
        .map(|trial| {
            let start = if trial == 0 {
                base_start.clone()
            } else {
                let mut rng = ChaCha8Rng::seed_from_u64(opts.seed.wrapping_add(trial as u64));
                perturb_start(&base_start, &mut rng)
            };
            run_trial(&filtered.matrix, start, opts, &step_opts)
        })
        .collect();

    let mut trials = Vec::with_capacity(opts.trials);
    let mut finished = Vec::with_capacity(opts.trials);
    for (trial, run) in runs.into_iter().enumerate() {
        let run = run?;
        trials.push(TrialSummary {
            trial,
            seed: opts.seed.wrapping_add(trial as u64),
            log_likelihood: run.log_likelihood,
            sweeps: run.sweeps,
            converged: run.converged,
        });
        finished.push(run);
    }

    let winning_trial = select_winner(&finished);
    let winner = finished.swap_remove(winning_trial);
    log::debug!(
        "trial {winning_trial} selected: loglik {:.4} after {} sweeps (converged: {})",
        winner.log_likelihood,
        winner.sweeps,
        winner.converged
    );

    let TrialRun { mut positions, mut bills, weights, trace, converged, sweeps, .. } = winner;
    let flipped_dimensions = apply_anchor_orientation(&mut positions, &mut bills, &anchors);
    let stats = fit_stats(&filtered.matrix, &positions, &bills, &weights);

    Ok(NominateFit {
        points: expand_points(&filtered.matrix, &positions),
        bills,
        weights,
        stats,
        converged,
        sweeps,
        trace,
        trials,
        winning_trial,
        flipped_dimensions,
        anchor_fallback: anchors.fallback_used,
        exclusions: filtered.exclusions,
    })
}

/// Index of the winning trial under the deterministic total order:
/// higher log-likelihood, then fewer sweeps, then lower index.
fn select_winner(runs: &[TrialRun]) -> usize {
    let mut best = 0;
    for (index, run) in runs.iter().enumerate().skip(1) {
        let incumbent = &runs[best];
        let better = run.log_likelihood > incumbent.log_likelihood
            || (run.log_likelihood == incumbent.log_likelihood && run.sweeps < incumbent.sweeps);
        if better {
            best = index;
        }
    }
    best
}

/// Turn a positions grid into per-legislator ideal points.
fn expand_points(matrix: &RollCallMatrix, positions: &Array2<f64>) -> Vec<IdealPoint> {
    matrix
        .legislators()
        .iter()
        .enumerate()
        .map(|(row, &legislator)| IdealPoint {
            legislator,
            period: matrix.period(),
            coords: positions.row(row).to_owned(),
        })
        .collect()
}

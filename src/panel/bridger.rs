//! The multi-period trajectory bridger.
//!
//! Purpose
//! -------
//! Link legislator identity across an ordered sequence of per-period
//! roll-call matrices and estimate polynomial position trajectories
//! jointly with per-period bill parameters, sharing one β / dimension
//! weight pair across the whole panel. The outer loop alternates a
//! per-period bill step with a per-legislator scatter/gather trajectory
//! refit, mirroring the single-period sweep structure.
//!
//! Key behaviors
//! -------------
//! - Requires at least `model_order + 2` periods; fewer is an
//!   insufficiency error before any work starts.
//! - Bill steps are independent across periods and across bills and run
//!   as a nested parallel map. The trajectory step gathers every active
//!   period of one legislator before refitting their coefficients;
//!   different legislators refit in parallel.
//! - β and the dimension weights are re-optimized *globally* over the
//!   panel on the usual cadence; per-period weights would break
//!   cross-period comparability.
//! - Polarity is fixed exactly once, after convergence, from the single
//!   global anchor; per-period sign fixing has no code path here because
//!   it would let a trajectory flip sign between periods.
//!
//! Invariants & assumptions
//! ------------------------
//! - Legislator ids are stable across periods; the registry join is the
//!   only bridging mechanism.
//! - Expanded positions are clamped into the unit ball before they feed a
//!   likelihood, matching the single-period constraint.
use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::optimization::loglik::StepOptions;
use crate::optimization::scalar::maximize_on_interval;
use crate::panel::trajectory::{fit_trajectory, Trajectory};
use crate::scaling::core::filter::{ensure_estimable, filter_matrix, Exclusion};
use crate::scaling::core::init::{clamp_to_unit_ball, spectral_start};
use crate::scaling::core::likelihood::matrix_log_likelihood;
use crate::scaling::core::options::PanelOptions;
use crate::scaling::core::params::{BillPoints, IdealPoint};
use crate::scaling::core::registry::LegislatorRegistry;
use crate::scaling::core::stats::{
    classification_tallies, stats_from_tallies, FitStats, FitTallies,
};
use crate::scaling::core::votes::{LegislatorId, RollCallMatrix};
use crate::scaling::core::weights::{ModelWeights, BETA_BOUNDS, WEIGHT_BOUNDS};
use crate::scaling::errors::{ScalingError, ScalingResult};
use crate::scaling::models::steps::{fit_bill, fit_legislator, initial_bill_points};

/// PanelFit — the full result of one multi-period estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelFit {
    /// One trajectory per legislator surviving any period's filters.
    pub trajectories: Vec<Trajectory>,
    /// Trajectories expanded to per-period ideal points, for every period
    /// a legislator appears in.
    pub points: Vec<IdealPoint>,
    /// Per-period bill reference points, flattened (each carries its
    /// period).
    pub bills: Vec<BillPoints>,
    /// The shared β / dimension weights.
    pub weights: ModelWeights,
    /// Panel-wide fit statistics.
    pub stats: FitStats,
    pub converged: bool,
    pub sweeps: usize,
    /// Panel-wide aggregate log-likelihood after each outer sweep.
    pub trace: Vec<f64>,
    /// Dimensions flipped by the global sign fix.
    pub flipped_dimensions: Vec<bool>,
    /// Whether the named global anchor was missing and replaced.
    pub anchor_fallback: bool,
    /// Exclusions from every period's preprocessing.
    pub exclusions: Vec<Exclusion>,
}

/// Estimate trajectories over an ordered panel of periods.
///
/// # Errors
/// - [`ScalingError::TooFewPeriods`] when `matrices.len() < model_order + 2`.
/// - [`ScalingError::PeriodsUnordered`] when period labels do not increase.
/// - Any per-period filtering/estimability error, and
///   [`ScalingError::SingularTrajectoryFit`] from a degenerate refit.
pub fn estimate_panel(
    matrices: &[RollCallMatrix], opts: &PanelOptions,
) -> ScalingResult<PanelFit> {
    let required = opts.required_periods();
    if matrices.len() < required {
        return Err(ScalingError::TooFewPeriods {
            periods: matrices.len(),
            required,
            order: opts.model_order,
        });
    }
    for (index, window) in matrices.windows(2).enumerate() {
        if window[1].period() <= window[0].period() {
            return Err(ScalingError::PeriodsUnordered {
                index: index + 1,
                previous: window[0].period(),
                current: window[1].period(),
            });
        }
    }

    let dims = opts.base.dims;
    let mut exclusions = Vec::new();
    let mut filtered = Vec::with_capacity(matrices.len());
    for matrix in matrices {
        let screened = filter_matrix(matrix, opts.base.minvotes, opts.base.lop)?;
        ensure_estimable(&screened.matrix, dims)?;
        exclusions.extend(screened.exclusions);
        filtered.push(screened.matrix);
    }

    let registry = LegislatorRegistry::from_periods(&filtered);
    let (anchor_id, anchor_fallback) =
        resolve_global_anchor(&registry, opts.anchor.legislator, filtered.len())?;

    // Per-period spectral starts, sign-aligned across consecutive periods
    // so the initial trajectories are not corrupted by the per-period sign
    // indeterminacy of the decomposition.
    let mut starts = Vec::with_capacity(filtered.len());
    for matrix in &filtered {
        starts.push(spectral_start(matrix, dims)?);
    }
    align_start_signs(&mut starts, &filtered);

    let index: BTreeMap<LegislatorId, usize> =
        registry.iter().enumerate().map(|(i, record)| (record.id, i)).collect();
    let mut trajectories = initial_trajectories(&registry, &starts, opts.model_order)?;

    let step_opts = StepOptions::default();
    let mut weights = ModelWeights::start(dims);
    let mut bills: Vec<Vec<BillPoints>> = {
        let positions = expand_all(&filtered, &trajectories, &index);
        filtered
            .iter()
            .enumerate()
            .map(|(t, matrix)| {
                (0..matrix.n_votes())
                    .map(|col| initial_bill_points(matrix, &positions[t], col))
                    .collect()
            })
            .collect()
    };

    let mut trace = Vec::with_capacity(opts.base.max_sweeps);
    let mut converged = false;
    let mut previous = f64::NEG_INFINITY;
    // The trajectory refit is a least-squares projection, so a sweep can
    // end slightly below its predecessor; the best state seen is what the
    // caller gets.
    let mut best: Option<(f64, Vec<Trajectory>, Vec<Vec<BillPoints>>, ModelWeights)> = None;

    for sweep in 0..opts.base.max_sweeps {
        // (a) Per-period bill step with trajectory-implied positions held
        // fixed. Independent across periods and across bills.
        let positions = expand_all(&filtered, &trajectories, &index);
        bills = filtered
            .par_iter()
            .enumerate()
            .map(|(t, matrix)| {
                (0..matrix.n_votes())
                    .into_par_iter()
                    .map(|col| {
                        fit_bill(&positions[t], matrix.column(col), &weights, &bills[t][col],
                            &step_opts)
                    })
                    .collect()
            })
            .collect();

        // (b) Scatter/gather trajectory step: gather every active period
        // of one legislator, then refit; legislators are independent.
        let records: Vec<&crate::scaling::core::registry::LegislatorRecord> =
            registry.iter().collect();
        let refits: Vec<ScalingResult<Trajectory>> = records
            .par_iter()
            .map(|record| {
                let current = &trajectories[index[&record.id]];
                let mut samples = Vec::with_capacity(record.presence.len());
                for presence in record.active_periods() {
                    let t = presence.period_index;
                    let mut incumbent = current.position_at(t);
                    clamp_coords(&mut incumbent);
                    let implied = fit_legislator(
                        &bills[t],
                        filtered[t].row(presence.row),
                        &weights,
                        incumbent.view(),
                        &step_opts,
                    );
                    samples.push((t, implied, presence.valid_ballots as f64));
                }
                if samples.is_empty() {
                    Ok(current.clone())
                } else {
                    fit_trajectory(record.id, &samples, opts.model_order)
                }
            })
            .collect();
        let mut refitted = Vec::with_capacity(refits.len());
        for refit in refits {
            refitted.push(refit?);
        }
        trajectories = refitted;

        // (c) Global β / weight re-optimization over the whole panel.
        if (sweep + 1) % opts.base.weight_update_interval == 0 {
            let positions = expand_all(&filtered, &trajectories, &index);
            update_panel_weights(&filtered, &positions, &bills, &mut weights);
        }

        let positions = expand_all(&filtered, &trajectories, &index);
        let loglik = panel_log_likelihood(&filtered, &positions, &bills, &weights);
        if !loglik.is_finite() {
            return Err(ScalingError::NonFiniteLogLikelihood { value: loglik });
        }
        trace.push(loglik);
        if best.as_ref().map(|(ll, ..)| loglik > *ll).unwrap_or(true) {
            best = Some((loglik, trajectories.clone(), bills.clone(), weights.clone()));
        }

        if sweep > 0 && loglik - previous < opts.base.tolerance {
            converged = true;
            previous = loglik;
            break;
        }
        previous = loglik;
    }

    if let Some((best_loglik, best_trajectories, best_bills, best_weights)) = best {
        previous = best_loglik;
        trajectories = best_trajectories;
        bills = best_bills;
        weights = best_weights;
    }

    // Polarity: fixed exactly once, globally, so no trajectory can flip
    // between periods.
    let flipped_dimensions =
        apply_global_orientation(opts, anchor_id, &index, &mut trajectories, &mut bills);

    let positions = expand_all(&filtered, &trajectories, &index);
    let mut tallies = FitTallies::default();
    for (t, matrix) in filtered.iter().enumerate() {
        tallies = tallies.merge(classification_tallies(matrix, &positions[t], &bills[t], &weights));
    }
    let stats = stats_from_tallies(tallies, previous);

    let points = expand_points(&filtered, &positions);
    let bills = bills.into_iter().flatten().collect();

    Ok(PanelFit {
        trajectories,
        points,
        bills,
        weights,
        stats,
        converged,
        sweeps: trace.len(),
        trace,
        flipped_dimensions,
        anchor_fallback,
        exclusions,
    })
}

/// Resolve the global anchor against the filtered panel.
///
/// A missing anchor is recoverable: prefer a legislator present in every
/// period, otherwise the lowest surviving id, with a warning either way.
fn resolve_global_anchor(
    registry: &LegislatorRegistry, requested: LegislatorId, n_periods: usize,
) -> ScalingResult<(LegislatorId, bool)> {
    if registry.get(requested).is_some() {
        return Ok((requested, false));
    }
    let fallback = registry
        .present_in_all(n_periods)
        .first()
        .copied()
        .or_else(|| registry.iter().next().map(|record| record.id))
        .ok_or(ScalingError::AnchorNotFound { id: requested })?;
    log::warn!(
        "global anchor {requested} was filtered out of every period; \
         falling back to {fallback}"
    );
    Ok((fallback, true))
}

/// Align the per-period spectral starts so shared legislators correlate
/// positively with the previous period on every dimension.
fn align_start_signs(starts: &mut [Array2<f64>], filtered: &[RollCallMatrix]) {
    for t in 1..filtered.len() {
        let dims = starts[t].ncols();
        for dim in 0..dims {
            let mut alignment = 0.0;
            for (row, &id) in filtered[t].legislators().iter().enumerate() {
                if let Some(prev_row) = filtered[t - 1].row_of(id) {
                    alignment += starts[t - 1][(prev_row, dim)] * starts[t][(row, dim)];
                }
            }
            if alignment < 0.0 {
                for row in 0..starts[t].nrows() {
                    starts[t][(row, dim)] = -starts[t][(row, dim)];
                }
            }
        }
    }
}

/// Fit the starting trajectories from the aligned spectral starts.
fn initial_trajectories(
    registry: &LegislatorRegistry, starts: &[Array2<f64>], order: usize,
) -> ScalingResult<Vec<Trajectory>> {
    let mut trajectories = Vec::with_capacity(registry.len());
    for record in registry.iter() {
        let samples: Vec<(usize, Array1<f64>, f64)> = record
            .active_periods()
            .map(|presence| {
                (
                    presence.period_index,
                    starts[presence.period_index].row(presence.row).to_owned(),
                    presence.valid_ballots as f64,
                )
            })
            .collect();
        if samples.is_empty() {
            // Present but with no valid ballots anywhere: pin at the first
            // period's spectral position.
            let first = &record.presence[0];
            trajectories.push(Trajectory::constant(
                record.id,
                starts[first.period_index].row(first.row).to_owned(),
                first.period_index,
            ));
        } else {
            trajectories.push(fit_trajectory(record.id, &samples, order)?);
        }
    }
    Ok(trajectories)
}

/// Expand trajectories into per-period position grids, clamped into the
/// unit ball.
fn expand_all(
    filtered: &[RollCallMatrix], trajectories: &[Trajectory],
    index: &BTreeMap<LegislatorId, usize>,
) -> Vec<Array2<f64>> {
    filtered
        .iter()
        .enumerate()
        .map(|(t, matrix)| {
            let dims = trajectories
                .first()
                .map(|trajectory| trajectory.dims())
                .unwrap_or(0);
            let mut positions = Array2::zeros((matrix.n_legislators(), dims));
            for (row, id) in matrix.legislators().iter().enumerate() {
                let trajectory = &trajectories[index[id]];
                positions.row_mut(row).assign(&trajectory.position_at(t));
            }
            clamp_to_unit_ball(&mut positions);
            positions
        })
        .collect()
}

/// Clamp one coordinate vector into the unit ball.
fn clamp_coords(coords: &mut Array1<f64>) {
    let norm = coords.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 1.0 {
        coords.mapv_inplace(|v| v / norm);
    }
}

/// Panel-wide aggregate log-likelihood.
fn panel_log_likelihood(
    filtered: &[RollCallMatrix], positions: &[Array2<f64>], bills: &[Vec<BillPoints>],
    weights: &ModelWeights,
) -> f64 {
    filtered
        .iter()
        .enumerate()
        .map(|(t, matrix)| matrix_log_likelihood(matrix, &positions[t], &bills[t], weights))
        .sum()
}

/// Bounded line searches for the shared β and free weights over the panel
/// log-likelihood, accepting only strict improvements.
fn update_panel_weights(
    filtered: &[RollCallMatrix], positions: &[Array2<f64>], bills: &[Vec<BillPoints>],
    weights: &mut ModelWeights,
) {
    let mut current = panel_log_likelihood(filtered, positions, bills, weights);

    let beta_objective = |beta: f64| {
        let mut candidate = weights.clone();
        candidate.set_beta(beta);
        panel_log_likelihood(filtered, positions, bills, &candidate)
    };
    match maximize_on_interval(&beta_objective, BETA_BOUNDS.0, BETA_BOUNDS.1, weights.beta()) {
        Ok(beta_hat) => {
            let improved = beta_objective(beta_hat);
            if improved > current {
                weights.set_beta(beta_hat);
                current = improved;
            }
        }
        Err(err) => log::debug!("panel beta line search kept incumbent: {err}"),
    }

    for dim in 1..weights.dims() {
        let weight_objective = |w: f64| {
            let mut candidate = weights.clone();
            candidate.set_weight(dim, w);
            panel_log_likelihood(filtered, positions, bills, &candidate)
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
            Err(err) => log::debug!("panel weight line search kept incumbent: {err}"),
        }
    }
}

/// Apply the single global sign fix from the anchor's expected signs.
fn apply_global_orientation(
    opts: &PanelOptions, anchor_id: LegislatorId, index: &BTreeMap<LegislatorId, usize>,
    trajectories: &mut [Trajectory], bills: &mut [Vec<BillPoints>],
) -> Vec<bool> {
    let dims = opts.base.dims;
    let mut flipped = vec![false; dims];
    let Some(&anchor_index) = index.get(&anchor_id) else {
        return flipped;
    };
    for (dim, sign) in opts.anchor.signs.iter().enumerate() {
        let anchor = &trajectories[anchor_index];
        let n = anchor.periods.len().max(1) as f64;
        let mean: f64 = anchor
            .periods
            .iter()
            .map(|&t| anchor.position_at(t)[dim])
            .sum::<f64>()
            / n;
        if sign.factor() * mean < 0.0 {
            flipped[dim] = true;
            for trajectory in trajectories.iter_mut() {
                trajectory.flip_dimension(dim);
            }
            for period_bills in bills.iter_mut() {
                for bill in period_bills.iter_mut() {
                    bill.flip_dimension(dim);
                }
            }
        }
    }
    flipped
}

/// Expand position grids into per-legislator, per-period ideal points.
fn expand_points(filtered: &[RollCallMatrix], positions: &[Array2<f64>]) -> Vec<IdealPoint> {
    let mut points = Vec::new();
    for (t, matrix) in filtered.iter().enumerate() {
        for (row, &legislator) in matrix.legislators().iter().enumerate() {
            points.push(IdealPoint {
                legislator,
                period: matrix.period(),
                coords: positions[t].row(row).to_owned(),
            });
        }
        debug_assert_eq!(matrix.n_legislators(), positions[t].nrows());
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::core::options::{AnchorSign, GlobalAnchor, ScalingOptions};
    use crate::scaling::core::votes::{VoteChoice, VoteId};
    use ndarray::Array2 as NdArray2;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The period-count gate for each model order.
    // - Period-ordering validation.
    // - Global-anchor fallback resolution.
    // - Sign alignment of per-period spectral starts.
    //
    // They intentionally DO NOT cover:
    // - Full panel estimation quality; the integration suite runs the
    //   bridger end to end on synthetic drift.
    // -------------------------------------------------------------------------

    fn bloc_period(period: usize, n: usize, votes: usize) -> RollCallMatrix {
        let grid = NdArray2::from_shape_fn((n, votes), |(i, _)| {
            if i < n / 2 {
                VoteChoice::Yea
            } else {
                VoteChoice::Nay
            }
        });
        RollCallMatrix::new(
            period,
            (0..n as u64).map(LegislatorId).collect(),
            (0..votes as u64).map(|v| VoteId(period as u64 * 1000 + v)).collect(),
            grid,
        )
        .expect("matrix should validate")
    }

    fn panel_opts(order: usize) -> PanelOptions {
        let base = ScalingOptions {
            dims: 1,
            minvotes: 0,
            lop: 0.0,
            trials: 1,
            max_sweeps: 3,
            tolerance: 1e-5,
            seed: 0,
            weight_update_interval: 3,
            anchors: crate::scaling::core::options::AnchorPolicy::RowFallback,
        };
        PanelOptions::new(
            base,
            order,
            GlobalAnchor { legislator: LegislatorId(0), signs: vec![AnchorSign::Negative] },
        )
        .expect("panel options should validate")
    }

    #[test]
    // Purpose
    // -------
    // The bridger must fail with the insufficiency error below the
    // order + 2 period floor and run at the floor.
    //
    // Given
    // -----
    // - model_order = 1 with 2 periods, then with 3 periods.
    //
    // Expect
    // ------
    // - TooFewPeriods { periods: 2, required: 3, order: 1 }, then Ok.
    fn period_count_gate_matches_model_order() {
        // Arrange
        let p: Vec<RollCallMatrix> = (0..3).map(|t| bloc_period(t, 6, 4)).collect();
        let opts = panel_opts(1);

        // Act & Assert
        match estimate_panel(&p[..2], &opts) {
            Err(ScalingError::TooFewPeriods { periods, required, order }) => {
                assert_eq!((periods, required, order), (2, 3, 1));
            }
            other => panic!("expected TooFewPeriods, got {:?}", other.map(|_| ())),
        }
        let fit = estimate_panel(&p, &opts).expect("three periods should estimate");
        assert_eq!(fit.trajectories.len(), 6);
    }

    #[test]
    // Purpose
    // -------
    // Periods supplied out of order must be rejected.
    //
    // Given
    // -----
    // - Periods labeled 0, 2, 1.
    //
    // Expect
    // ------
    // - PeriodsUnordered at index 2.
    fn unordered_periods_are_rejected() {
        // Arrange
        let p = vec![bloc_period(0, 6, 4), bloc_period(2, 6, 4), bloc_period(1, 6, 4)];
        let opts = panel_opts(0);

        // Act
        let result = estimate_panel(&p, &opts);

        // Assert
        assert!(matches!(
            result,
            Err(ScalingError::PeriodsUnordered { index: 2, previous: 2, current: 1 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A missing global anchor must fall back to a legislator present in
    // all periods, flagged as fallback.
    //
    // Given
    // -----
    // - A registry over two bloc periods; a requested anchor id that never
    //   appears.
    //
    // Expect
    // ------
    // - Ok((present id, true)); a present requested id resolves to itself
    //   with false.
    fn global_anchor_falls_back_to_common_legislator() {
        // Arrange
        let p = vec![bloc_period(0, 6, 4), bloc_period(1, 6, 4)];
        let registry = LegislatorRegistry::from_periods(&p);

        // Act
        let (fallback, fell_back) = resolve_global_anchor(&registry, LegislatorId(99), 2)
            .expect("fallback should resolve");
        let (kept, flagged) = resolve_global_anchor(&registry, LegislatorId(3), 2)
            .expect("present anchor should resolve");

        // Assert
        assert_eq!(fallback, LegislatorId(0));
        assert!(fell_back);
        assert_eq!(kept, LegislatorId(3));
        assert!(!flagged);
    }

    #[test]
    // Purpose
    // -------
    // Start alignment must flip a period whose spectral signs came out
    // mirrored relative to the previous period.
    //
    // Given
    // -----
    // - Two identical 1-D starts with the second negated.
    //
    // Expect
    // ------
    // - After alignment the second equals the first.
    fn start_alignment_unmirrors_consecutive_periods() {
        // Arrange
        let p = vec![bloc_period(0, 4, 3), bloc_period(1, 4, 3)];
        let first =
            NdArray2::from_shape_vec((4, 1), vec![-0.5, -0.4, 0.4, 0.5]).expect("shape consistent");
        let second = first.mapv(|v| -v);
        let mut starts = vec![first.clone(), second];

        // Act
        align_start_signs(&mut starts, &p);

        // Assert
        assert_eq!(starts[1], first);
    }
}

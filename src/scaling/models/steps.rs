//! The two half-steps of the alternating optimization, as pure functions.
//!
//! Purpose
//! -------
//! Expose the bill step and the legislator step as side-effect-free
//! fixed-side-in, best-fit-other-side-out functions. Each function owns no
//! shared state, which is what lets the sweep loop run them as a parallel
//! map with a barrier between the half-steps, and what makes each step
//! testable on its own.
//!
//! Key behaviors
//! -------------
//! - [`fit_bill`]: holding every legislator position fixed, maximize one
//!   column's log-likelihood over the bill's yea and nay points (2D free
//!   parameters).
//! - [`fit_legislator`]: holding every bill fixed, maximize one row's
//!   log-likelihood over the legislator's position (D free parameters),
//!   then project back into the unit ball.
//! - Both steps are monotone in the sweep objective: the incumbent
//!   parameters are kept whenever the solver fails or fails to improve, so
//!   a half-step can never decrease the aggregate log-likelihood.
//!
//! Invariants & assumptions
//! ------------------------
//! - `positions` rows align with the choice column handed to [`fit_bill`];
//!   `bills` align with the choice row handed to [`fit_legislator`].
//! - Incumbent legislator positions lie inside the unit ball; the
//!   projection keeps that true for every output.
use ndarray::{s, Array1, Array2, ArrayView1};

use crate::optimization::errors::{OptError, OptResult};
use crate::optimization::loglik::{maximize, LogLik, StepOptions, Theta};
use crate::scaling::core::likelihood::{column_log_likelihood, row_log_likelihood};
use crate::scaling::core::params::BillPoints;
use crate::scaling::core::votes::{RollCallMatrix, VoteChoice};
use crate::scaling::core::weights::ModelWeights;

/// Bill-step problem: one column's log-likelihood as a function of the
/// stacked yea/nay points `theta = [yea_0..yea_D, nay_0..nay_D]`.
pub struct BillStep<'a> {
    pub positions: &'a Array2<f64>,
    pub choices: ArrayView1<'a, VoteChoice>,
    pub weights: &'a ModelWeights,
}

impl LogLik for BillStep<'_> {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
        let dims = self.weights.dims();
        let yea = theta.slice(s![0..dims]);
        let nay = theta.slice(s![dims..2 * dims]);
        Ok(column_log_likelihood(self.choices, self.positions, yea, nay, self.weights))
    }

    fn check(&self, theta: &Theta, _data: &()) -> OptResult<()> {
        let expected = 2 * self.weights.dims();
        if theta.len() != expected {
            return Err(OptError::ParamLengthMismatch { expected, actual: theta.len() });
        }
        for (index, &value) in theta.iter().enumerate() {
            if !value.is_finite() {
                return Err(OptError::NonFiniteParam { index, value });
            }
        }
        Ok(())
    }
}

/// Legislator-step problem: one row's log-likelihood as a function of the
/// legislator's position.
pub struct LegislatorStep<'a> {
    pub bills: &'a [BillPoints],
    pub choices: ArrayView1<'a, VoteChoice>,
    pub weights: &'a ModelWeights,
}

impl LogLik for LegislatorStep<'_> {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<f64> {
        Ok(row_log_likelihood(self.choices, theta.view(), self.bills, self.weights))
    }

    fn check(&self, theta: &Theta, _data: &()) -> OptResult<()> {
        let expected = self.weights.dims();
        if theta.len() != expected {
            return Err(OptError::ParamLengthMismatch { expected, actual: theta.len() });
        }
        for (index, &value) in theta.iter().enumerate() {
            if !value.is_finite() {
                return Err(OptError::NonFiniteParam { index, value });
            }
        }
        Ok(())
    }
}

/// Refit one bill's reference points with legislator positions held fixed.
///
/// Starts from the incumbent points and returns whichever of {incumbent,
/// solver result} scores higher on the column log-likelihood. Solver
/// failures are absorbed (the incumbent is returned) and logged at debug
/// level; they indicate a flat column objective, not invalid input.
pub fn fit_bill<'a>(
    positions: &'a Array2<f64>, choices: ArrayView1<'a, VoteChoice>, weights: &'a ModelWeights,
    incumbent: &BillPoints, opts: &StepOptions,
) -> BillPoints {
    let dims = weights.dims();
    let problem = BillStep { positions, choices, weights };
    let mut theta0 = Array1::zeros(2 * dims);
    theta0.slice_mut(s![0..dims]).assign(&incumbent.yea);
    theta0.slice_mut(s![dims..2 * dims]).assign(&incumbent.nay);
    let incumbent_ll = match problem.value(&theta0, &()) {
        Ok(ll) => ll,
        Err(_) => f64::NEG_INFINITY,
    };

    match maximize(&problem, &(), theta0, opts) {
        Ok(fit) if fit.loglik > incumbent_ll => BillPoints {
            vote: incumbent.vote,
            period: incumbent.period,
            yea: fit.theta.slice(s![0..dims]).to_owned(),
            nay: fit.theta.slice(s![dims..2 * dims]).to_owned(),
        },
        Ok(_) => incumbent.clone(),
        Err(err) => {
            log::debug!("bill step kept incumbent for {}: {err}", incumbent.vote);
            incumbent.clone()
        }
    }
}

/// Refit one legislator's position with every bill held fixed.
///
/// The solver result is projected into the unit ball before comparison, so
/// the returned position always respects the constraint and never scores
/// below the incumbent.
pub fn fit_legislator<'a>(
    bills: &'a [BillPoints], choices: ArrayView1<'a, VoteChoice>, weights: &'a ModelWeights,
    incumbent: ArrayView1<'_, f64>, opts: &StepOptions,
) -> Array1<f64> {
    let problem = LegislatorStep { bills, choices, weights };
    let theta0 = incumbent.to_owned();
    let incumbent_ll = match problem.value(&theta0, &()) {
        Ok(ll) => ll,
        Err(_) => f64::NEG_INFINITY,
    };

    match maximize(&problem, &(), theta0, opts) {
        Ok(fit) => {
            let mut candidate = fit.theta;
            let norm = candidate.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 1.0 {
                candidate.mapv_inplace(|v| v / norm);
            }
            let candidate_ll = match problem.value(&candidate, &()) {
                Ok(ll) => ll,
                Err(_) => f64::NEG_INFINITY,
            };
            if candidate_ll > incumbent_ll {
                candidate
            } else {
                incumbent.to_owned()
            }
        }
        Err(err) => {
            log::debug!("legislator step kept incumbent: {err}");
            incumbent.to_owned()
        }
    }
}

/// Warm-start reference points for one column: the mean position of the
/// yea voters and of the nay voters. Used before the first sweep, when no
/// incumbent exists yet.
pub fn initial_bill_points(
    matrix: &RollCallMatrix, positions: &Array2<f64>, col: usize,
) -> BillPoints {
    let dims = positions.ncols();
    let mut yea = Array1::zeros(dims);
    let mut nay = Array1::zeros(dims);
    let mut n_yea = 0usize;
    let mut n_nay = 0usize;
    for row in 0..matrix.n_legislators() {
        match matrix.choice(row, col) {
            VoteChoice::Yea => {
                yea += &positions.row(row);
                n_yea += 1;
            }
            VoteChoice::Nay => {
                nay += &positions.row(row);
                n_nay += 1;
            }
            _ => {}
        }
    }
    if n_yea > 0 {
        yea.mapv_inplace(|v| v / n_yea as f64);
    }
    if n_nay > 0 {
        nay.mapv_inplace(|v| v / n_nay as f64);
    }
    BillPoints { vote: matrix.votes()[col], period: matrix.period(), yea, nay }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::core::votes::{LegislatorId, VoteId};
    use ndarray::array;
    use ndarray::Array2 as NdArray2;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Monotonicity: each half-step never scores below its incumbent.
    // - The unit-ball projection in the legislator step.
    // - Warm-start points from voter means.
    //
    // They intentionally DO NOT cover:
    // - Full alternating sweeps; those live in the model and integration
    //   tests.
    // -------------------------------------------------------------------------

    fn bloc_matrix() -> (RollCallMatrix, NdArray2<f64>, ModelWeights) {
        // 6 legislators, 3 votes, all splitting the same two blocs.
        let grid = NdArray2::from_shape_fn((6, 3), |(i, _)| {
            if i < 3 {
                VoteChoice::Yea
            } else {
                VoteChoice::Nay
            }
        });
        let matrix = RollCallMatrix::new(
            0,
            (0..6).map(LegislatorId).collect(),
            (0..3).map(VoteId).collect(),
            grid,
        )
        .expect("matrix should validate");
        let positions = NdArray2::from_shape_vec(
            (6, 1),
            vec![-0.8, -0.7, -0.6, 0.6, 0.7, 0.8],
        )
        .expect("shape consistent");
        let mut weights = ModelWeights::start(1);
        weights.set_beta(8.0);
        (matrix, positions, weights)
    }

    #[test]
    // Purpose
    // -------
    // The bill step must improve (or keep) the column log-likelihood
    // relative to a deliberately bad incumbent.
    //
    // Given
    // -----
    // - The bloc fixture with an incumbent whose yea/nay points are
    //   swapped relative to the data.
    //
    // Expect
    // ------
    // - The refit column log-likelihood strictly exceeds the incumbent's.
    fn bill_step_improves_a_bad_incumbent() {
        // Arrange
        let (matrix, positions, weights) = bloc_matrix();
        let incumbent = BillPoints {
            vote: VoteId(0),
            period: 0,
            yea: array![0.5],
            nay: array![-0.5],
        };
        let problem =
            BillStep { positions: &positions, choices: matrix.column(0), weights: &weights };
        let mut theta0 = Array1::zeros(2);
        theta0[0] = incumbent.yea[0];
        theta0[1] = incumbent.nay[0];
        let before = problem.value(&theta0, &()).expect("value should evaluate");

        // Act
        let refit = fit_bill(
            &positions,
            matrix.column(0),
            &weights,
            &incumbent,
            &StepOptions::default(),
        );

        // Assert
        let mut theta1 = Array1::zeros(2);
        theta1[0] = refit.yea[0];
        theta1[1] = refit.nay[0];
        let after = problem.value(&theta1, &()).expect("value should evaluate");
        assert!(after > before, "after = {after}, before = {before}");
        assert!(refit.yea[0] < refit.nay[0], "yea point should sit with the yea bloc");
    }

    #[test]
    // Purpose
    // -------
    // The legislator step must pull a misplaced legislator toward their
    // voting bloc and never return a position outside the unit ball.
    //
    // Given
    // -----
    // - The bloc fixture; legislator 0 (a Yea voter) restarted from +0.5,
    //   with bills already separating the blocs.
    //
    // Expect
    // ------
    // - The refit position is strictly below the incumbent, with norm <= 1,
    //   and scores at least as well.
    fn legislator_step_moves_toward_own_bloc() {
        // Arrange
        let (matrix, _positions, weights) = bloc_matrix();
        let bills: Vec<BillPoints> = (0..3)
            .map(|v| BillPoints {
                vote: VoteId(v),
                period: 0,
                yea: array![-0.7],
                nay: array![0.7],
            })
            .collect();
        let incumbent = array![0.5];

        // Act
        let refit = fit_legislator(
            &bills,
            matrix.row(0),
            &weights,
            incumbent.view(),
            &StepOptions::default(),
        );

        // Assert
        assert!(refit[0] < 0.5, "refit = {}", refit[0]);
        assert!(refit[0].abs() <= 1.0 + 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Warm-start points must equal the yea-voter and nay-voter mean
    // positions.
    //
    // Given
    // -----
    // - The bloc fixture (yea bloc mean -0.7, nay bloc mean 0.7).
    //
    // Expect
    // ------
    // - initial_bill_points returns yea = -0.7, nay = 0.7.
    fn initial_points_are_voter_means() {
        // Arrange
        let (matrix, positions, _weights) = bloc_matrix();

        // Act
        let points = initial_bill_points(&matrix, &positions, 0);

        // Assert
        assert!((points.yea[0] + 0.7).abs() < 1e-12);
        assert!((points.nay[0] - 0.7).abs() < 1e-12);
    }
}

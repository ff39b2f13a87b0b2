//! The spatial voting likelihood.
//!
//! Purpose
//! -------
//! Implement the Gaussian-kernel random-utility model shared by every
//! component: a legislator at position x derives utility
//! `u(z) = exp(-0.5 * sum_d w_d^2 (x_d - z_d)^2)` from an outcome located
//! at z, and votes Yea with probability `Phi(beta * (u(yea) - u(nay)))`.
//! Only Yea/Nay ballots enter any of the sums; abstentions and missing
//! cells contribute nothing.
//!
//! Key behaviors
//! -------------
//! - Probabilities are clamped away from 0 and 1 before taking logs, so a
//!   badly-placed point during early sweeps produces a large-but-finite
//!   penalty instead of `-inf`.
//! - Aggregates come in three granularities: one column (bill step), one
//!   row (legislator step), and the whole matrix (convergence checks and
//!   the β/w line searches).
//!
//! Invariants & assumptions
//! ------------------------
//! - `positions` rows align with matrix rows; `bills` align with matrix
//!   columns; `weights.dims()` equals the coordinate length everywhere.
//!   Callers uphold the alignment; the hot loops do not re-validate it.
use ndarray::{Array2, ArrayView1};
use statrs::function::erf::erf;

use crate::scaling::core::params::BillPoints;
use crate::scaling::core::votes::{RollCallMatrix, VoteChoice};
use crate::scaling::core::weights::ModelWeights;

/// Floor applied to choice probabilities before logs.
pub const PROB_FLOOR: f64 = 1e-9;

/// Standard normal CDF.
pub fn std_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Gaussian kernel utility of an outcome at `z` for a legislator at `x`.
pub fn kernel_utility(x: ArrayView1<'_, f64>, z: ArrayView1<'_, f64>, weights: &ModelWeights) -> f64 {
    let mut ssq = 0.0;
    for ((xd, zd), wd) in x.iter().zip(z.iter()).zip(weights.weights().iter()) {
        let diff = xd - zd;
        ssq += wd * wd * diff * diff;
    }
    (-0.5 * ssq).exp()
}

/// Probability of a Yea ballot, clamped into `(PROB_FLOOR, 1 - PROB_FLOOR)`.
pub fn yea_probability(
    x: ArrayView1<'_, f64>, yea: ArrayView1<'_, f64>, nay: ArrayView1<'_, f64>,
    weights: &ModelWeights,
) -> f64 {
    let u_yea = kernel_utility(x, yea, weights);
    let u_nay = kernel_utility(x, nay, weights);
    let p = std_normal_cdf(weights.beta() * (u_yea - u_nay));
    p.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR)
}

/// Log-probability of one observed choice, or `None` for non-valid cells.
pub fn choice_log_prob(
    choice: VoteChoice, x: ArrayView1<'_, f64>, bill: &BillPoints, weights: &ModelWeights,
) -> Option<f64> {
    let p_yea = match choice {
        VoteChoice::Yea | VoteChoice::Nay => {
            yea_probability(x, bill.yea.view(), bill.nay.view(), weights)
        }
        _ => return None,
    };
    match choice {
        VoteChoice::Yea => Some(p_yea.ln()),
        VoteChoice::Nay => Some((1.0 - p_yea).ln()),
        _ => None,
    }
}

/// Log-likelihood of one bill's column given fixed legislator positions.
pub fn column_log_likelihood(
    choices: ArrayView1<'_, VoteChoice>, positions: &Array2<f64>, yea: ArrayView1<'_, f64>,
    nay: ArrayView1<'_, f64>, weights: &ModelWeights,
) -> f64 {
    let mut total = 0.0;
    for (row, &choice) in choices.iter().enumerate() {
        if !choice.is_valid() {
            continue;
        }
        let p_yea = yea_probability(positions.row(row), yea, nay, weights);
        total += match choice {
            VoteChoice::Yea => p_yea.ln(),
            _ => (1.0 - p_yea).ln(),
        };
    }
    total
}

/// Log-likelihood of one legislator's row given fixed bill points.
pub fn row_log_likelihood(
    choices: ArrayView1<'_, VoteChoice>, x: ArrayView1<'_, f64>, bills: &[BillPoints],
    weights: &ModelWeights,
) -> f64 {
    let mut total = 0.0;
    for (col, &choice) in choices.iter().enumerate() {
        if let Some(lp) = choice_log_prob(choice, x, &bills[col], weights) {
            total += lp;
        }
    }
    total
}

/// Aggregate log-likelihood of a whole matrix.
pub fn matrix_log_likelihood(
    matrix: &RollCallMatrix, positions: &Array2<f64>, bills: &[BillPoints],
    weights: &ModelWeights,
) -> f64 {
    let mut total = 0.0;
    for row in 0..matrix.n_legislators() {
        total += row_log_likelihood(matrix.row(row), positions.row(row), bills, weights);
    }
    total
}

/// Number of valid choices in a matrix (the likelihood's sample size).
pub fn n_valid_choices(matrix: &RollCallMatrix) -> usize {
    (0..matrix.n_legislators()).map(|row| matrix.valid_ballots_in_row(row)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::core::votes::{LegislatorId, VoteId};
    use ndarray::{array, Array2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The normal CDF against known quantiles.
    // - Kernel utility geometry: distance and weight effects.
    // - Probability clamping and Yea/Nay symmetry of the log-probability.
    // - Row/column/matrix aggregation consistency.
    // -------------------------------------------------------------------------

    fn unit_weights(dims: usize) -> ModelWeights {
        let mut w = ModelWeights::start(dims);
        // Pull every dimension to weight 1 so geometry is easy to reason
        // about in the assertions below.
        for d in 1..dims {
            w.set_weight(d, 1.0);
        }
        w.set_beta(5.0);
        w
    }

    fn bill(yea: ndarray::Array1<f64>, nay: ndarray::Array1<f64>) -> BillPoints {
        BillPoints { vote: VoteId(0), period: 0, yea, nay }
    }

    #[test]
    // Purpose
    // -------
    // Verify the CDF at 0 and at +/- 1.96.
    //
    // Given
    // -----
    // - Standard normal quantiles.
    //
    // Expect
    // ------
    // - Phi(0) == 0.5 exactly; Phi(1.96) within 1e-4 of 0.975.
    fn normal_cdf_matches_known_quantiles() {
        assert!((std_normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((std_normal_cdf(1.96) - 0.975).abs() < 1e-4);
        assert!((std_normal_cdf(-1.96) - 0.025).abs() < 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // Check the kernel utility decays with distance and responds to
    // dimension weights.
    //
    // Given
    // -----
    // - A legislator at the origin; outcomes at distance 0 and 1; a second
    //   configuration where the off dimension is down-weighted.
    //
    // Expect
    // ------
    // - u(0) == 1; u decreases with distance; down-weighting a dimension
    //   raises the utility of an outcome displaced along it.
    fn kernel_utility_decays_with_weighted_distance() {
        // Arrange
        let weights = unit_weights(2);
        let x = array![0.0, 0.0];

        // Act
        let at_zero = kernel_utility(x.view(), array![0.0, 0.0].view(), &weights);
        let at_one = kernel_utility(x.view(), array![0.0, 1.0].view(), &weights);

        let mut soft = unit_weights(2);
        soft.set_weight(1, 0.1);
        let softened = kernel_utility(x.view(), array![0.0, 1.0].view(), &soft);

        // Assert
        assert!((at_zero - 1.0).abs() < 1e-12);
        assert!(at_one < at_zero);
        assert!(softened > at_one);
    }

    #[test]
    // Purpose
    // -------
    // Ensure probabilities stay inside the clamp even for an extreme
    // utility difference, and that Yea/Nay log-probabilities are symmetric
    // complements.
    //
    // Given
    // -----
    // - beta at its ceiling and a legislator sitting on the yea point far
    //   from the nay point.
    //
    // Expect
    // ------
    // - p in (0, 1); ln p(Yea) + ln p(Nay) == ln(p) + ln(1 - p).
    fn probabilities_are_clamped_and_complementary() {
        // Arrange
        let mut weights = unit_weights(1);
        weights.set_beta(30.0);
        let b = bill(array![0.9], array![-0.9]);
        let x = array![0.9];

        // Act
        let p = yea_probability(x.view(), b.yea.view(), b.nay.view(), &weights);
        let lp_yea = choice_log_prob(VoteChoice::Yea, x.view(), &b, &weights)
            .expect("Yea is a valid choice");
        let lp_nay = choice_log_prob(VoteChoice::Nay, x.view(), &b, &weights)
            .expect("Nay is a valid choice");

        // Assert
        assert!(p > 0.0 && p < 1.0);
        assert!(p >= 1.0 - 2.0 * PROB_FLOOR);
        assert!((lp_yea - p.ln()).abs() < 1e-12);
        assert!((lp_nay - (1.0 - p).ln()).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Confirm Absent and Missing cells contribute nothing anywhere.
    //
    // Given
    // -----
    // - A 2x2 matrix where one row is all Absent/Missing.
    //
    // Expect
    // ------
    // - choice_log_prob returns None for both; the matrix log-likelihood
    //   equals the active row's log-likelihood alone.
    fn invalid_cells_never_enter_the_likelihood() {
        // Arrange
        let weights = unit_weights(1);
        let bills = vec![bill(array![0.5], array![-0.5]), bill(array![0.3], array![-0.3])];
        let grid = Array2::from_shape_vec(
            (2, 2),
            vec![VoteChoice::Yea, VoteChoice::Nay, VoteChoice::Absent, VoteChoice::Missing],
        )
        .expect("shape consistent");
        let matrix = RollCallMatrix::new(
            0,
            vec![LegislatorId(1), LegislatorId(2)],
            vec![VoteId(1), VoteId(2)],
            grid,
        )
        .expect("matrix should validate");
        let positions = Array2::from_shape_vec((2, 1), vec![0.4, -0.4]).expect("shape consistent");

        // Act
        let x1 = positions.row(1);
        let none_a = choice_log_prob(VoteChoice::Absent, x1, &bills[0], &weights);
        let none_m = choice_log_prob(VoteChoice::Missing, x1, &bills[1], &weights);
        let whole = matrix_log_likelihood(&matrix, &positions, &bills, &weights);
        let active_row = row_log_likelihood(matrix.row(0), positions.row(0), &bills, &weights);

        // Assert
        assert!(none_a.is_none() && none_m.is_none());
        assert!((whole - active_row).abs() < 1e-12);
        assert_eq!(n_valid_choices(&matrix), 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify column aggregation agrees with summing choice_log_prob down
    // the column.
    //
    // Given
    // -----
    // - A 3x1 matrix of mixed choices and arbitrary positions.
    //
    // Expect
    // ------
    // - column_log_likelihood equals the manual sum within 1e-12.
    fn column_aggregation_matches_manual_sum() {
        // Arrange
        let weights = unit_weights(1);
        let b = bill(array![0.6], array![-0.2]);
        let grid = Array2::from_shape_vec(
            (3, 1),
            vec![VoteChoice::Yea, VoteChoice::Nay, VoteChoice::Absent],
        )
        .expect("shape consistent");
        let matrix = RollCallMatrix::new(
            0,
            vec![LegislatorId(1), LegislatorId(2), LegislatorId(3)],
            vec![VoteId(1)],
            grid,
        )
        .expect("matrix should validate");
        let positions =
            Array2::from_shape_vec((3, 1), vec![0.7, -0.5, 0.0]).expect("shape consistent");

        // Act
        let col =
            column_log_likelihood(matrix.column(0), &positions, b.yea.view(), b.nay.view(), &weights);
        let manual: f64 = (0..3)
            .filter_map(|row| {
                choice_log_prob(matrix.choice(row, 0), positions.row(row), &b, &weights)
            })
            .sum();

        // Assert
        assert!((col - manual).abs() < 1e-12);
    }
}

//! Fit statistics: classification rate, APRE, and geometric mean
//! probability.
//!
//! Classification treats a choice as predicted Yea when the model
//! probability exceeds one half. APRE compares the model's classification
//! errors against the majority-vote baseline per roll call:
//! `sum_j (minority_j - errors_j) / sum_j minority_j`. GMP is
//! `exp(loglik / n)` over the valid choices.
use ndarray::Array2;

use crate::scaling::core::likelihood::{n_valid_choices, yea_probability};
use crate::scaling::core::params::BillPoints;
use crate::scaling::core::votes::{RollCallMatrix, VoteChoice};
use crate::scaling::core::weights::ModelWeights;

/// Summary statistics for one fitted matrix (or panel of matrices).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitStats {
    /// Aggregate log-likelihood over valid choices.
    pub log_likelihood: f64,
    /// Share of valid choices classified correctly.
    pub correct_classification: f64,
    /// Aggregate proportional reduction in error versus the majority
    /// baseline.
    pub apre: f64,
    /// Geometric mean probability of the observed choices.
    pub gmp: f64,
    /// Number of valid choices entering the statistics.
    pub n_choices: usize,
}

impl FitStats {
    /// An empty accumulator for panel-wide aggregation.
    pub(crate) fn zero() -> Self {
        Self {
            log_likelihood: 0.0,
            correct_classification: 0.0,
            apre: 0.0,
            gmp: 0.0,
            n_choices: 0,
        }
    }
}

/// Raw per-matrix tallies, mergeable across periods before the ratios are
/// taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FitTallies {
    pub correct: usize,
    pub errors: usize,
    pub minority: usize,
    pub n_choices: usize,
}

impl FitTallies {
    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            correct: self.correct + other.correct,
            errors: self.errors + other.errors,
            minority: self.minority + other.minority,
            n_choices: self.n_choices + other.n_choices,
        }
    }
}

/// Count classification outcomes for one matrix under fixed parameters.
pub(crate) fn classification_tallies(
    matrix: &RollCallMatrix, positions: &Array2<f64>, bills: &[BillPoints],
    weights: &ModelWeights,
) -> FitTallies {
    let mut tallies = FitTallies::default();
    for col in 0..matrix.n_votes() {
        let (yea, nay) = matrix.tallies_in_column(col);
        tallies.minority += yea.min(nay);
        let bill = &bills[col];
        for row in 0..matrix.n_legislators() {
            let choice = matrix.choice(row, col);
            if !choice.is_valid() {
                continue;
            }
            tallies.n_choices += 1;
            let p_yea =
                yea_probability(positions.row(row), bill.yea.view(), bill.nay.view(), weights);
            let predicted_yea = p_yea > 0.5;
            let observed_yea = choice == VoteChoice::Yea;
            if predicted_yea == observed_yea {
                tallies.correct += 1;
            } else {
                tallies.errors += 1;
            }
        }
    }
    tallies
}

/// Turn merged tallies plus an aggregate log-likelihood into [`FitStats`].
pub(crate) fn stats_from_tallies(tallies: FitTallies, log_likelihood: f64) -> FitStats {
    let n = tallies.n_choices;
    let correct_classification =
        if n == 0 { 0.0 } else { tallies.correct as f64 / n as f64 };
    let apre = if tallies.minority == 0 {
        0.0
    } else {
        (tallies.minority as f64 - tallies.errors as f64) / tallies.minority as f64
    };
    let gmp = if n == 0 { 0.0 } else { (log_likelihood / n as f64).exp() };
    FitStats { log_likelihood, correct_classification, apre, gmp, n_choices: n }
}

/// Compute all fit statistics for one matrix.
pub fn fit_stats(
    matrix: &RollCallMatrix, positions: &Array2<f64>, bills: &[BillPoints],
    weights: &ModelWeights,
) -> FitStats {
    let tallies = classification_tallies(matrix, positions, bills, weights);
    let loglik = crate::scaling::core::likelihood::matrix_log_likelihood(
        matrix, positions, bills, weights,
    );
    debug_assert_eq!(tallies.n_choices, n_valid_choices(matrix));
    stats_from_tallies(tallies, loglik)
}

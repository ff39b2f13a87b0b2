//! Starting configurations: the spectral start and trial perturbations.
//!
//! Purpose
//! -------
//! Derive an initial D-dimensional position per legislator from the
//! classic agreement-score decomposition: pairwise agreement rates are
//! turned into squared distances, double-centered, and the leading
//! eigenpairs of the centered matrix (scaled by the square roots of their
//! eigenvalues) become starting coordinates. Later trials jitter this
//! start with seeded Gaussian noise so independent restarts explore
//! different basins.
//!
//! Key behaviors
//! -------------
//! - Agreement between two legislators is the share of roll calls both
//!   voted validly on where they chose the same side; pairs with no shared
//!   valid ballots fall back to a neutral 0.5.
//! - The eigendecomposition runs through nalgebra's symmetric solver; the
//!   double-centered matrix is symmetric by construction.
//! - All starting positions are scaled into the unit ball, matching the
//!   constraint the legislator half-step maintains during estimation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rows of the returned array align with the matrix's legislator rows.
//! - For a fixed matrix and seed the output is bit-for-bit reproducible.
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::scaling::core::votes::RollCallMatrix;
use crate::scaling::errors::ScalingResult;

/// Standard deviation of the Gaussian jitter applied to non-first trials.
pub const START_JITTER_SD: f64 = 0.1;

/// Compute pairwise agreement scores between legislator rows.
///
/// Entry (i, k) is the fraction of columns where both rows hold valid
/// ballots and agree; 0.5 when the pair shares no valid column.
fn agreement_scores(matrix: &RollCallMatrix) -> DMatrix<f64> {
    let n = matrix.n_legislators();
    let mut scores = DMatrix::zeros(n, n);
    for i in 0..n {
        scores[(i, i)] = 1.0;
        for k in (i + 1)..n {
            let mut shared = 0usize;
            let mut agree = 0usize;
            for col in 0..matrix.n_votes() {
                let a = matrix.choice(i, col);
                let b = matrix.choice(k, col);
                if a.is_valid() && b.is_valid() {
                    shared += 1;
                    if a == b {
                        agree += 1;
                    }
                }
            }
            let score = if shared == 0 { 0.5 } else { agree as f64 / shared as f64 };
            scores[(i, k)] = score;
            scores[(k, i)] = score;
        }
    }
    scores
}

/// Spectral starting positions for every legislator row.
///
/// Disagreement rates are treated as distances, squared, double-centered,
/// and decomposed; the top `dims` eigenpairs (eigenvalues clamped at zero)
/// give the coordinates, which are then scaled into the unit ball.
pub fn spectral_start(matrix: &RollCallMatrix, dims: usize) -> ScalingResult<Array2<f64>> {
    let n = matrix.n_legislators();
    let scores = agreement_scores(matrix);

    // Squared distances and double centering: B = -1/2 * J D2 J.
    let mut centered = DMatrix::zeros(n, n);
    for i in 0..n {
        for k in 0..n {
            let d = 1.0 - scores[(i, k)];
            centered[(i, k)] = d * d;
        }
    }
    let row_means: Vec<f64> = (0..n).map(|i| centered.row(i).sum() / n as f64).collect();
    let grand_mean: f64 = row_means.iter().sum::<f64>() / n as f64;
    for i in 0..n {
        for k in 0..n {
            centered[(i, k)] = -0.5 * (centered[(i, k)] - row_means[i] - row_means[k] + grand_mean);
        }
    }

    let eigen = SymmetricEigen::new(centered);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut start = Array2::zeros((n, dims));
    for (d, &idx) in order.iter().take(dims).enumerate() {
        let scale = eigen.eigenvalues[idx].max(0.0).sqrt();
        for i in 0..n {
            start[(i, d)] = scale * eigen.eigenvectors[(i, idx)];
        }
    }

    clamp_to_unit_ball(&mut start);
    Ok(start)
}

/// Jitter a starting configuration for one restart.
///
/// Adds independent `N(0, START_JITTER_SD)` noise to every coordinate and
/// re-projects into the unit ball. The caller supplies an already-seeded
/// RNG so restarts are reproducible.
pub fn perturb_start(start: &Array2<f64>, rng: &mut ChaCha8Rng) -> Array2<f64> {
    // The parameters are compile-time constants; construction cannot fail.
    let noise = Normal::new(0.0, START_JITTER_SD).expect("constant jitter parameters are valid");
    let mut jittered = start.clone();
    for value in jittered.iter_mut() {
        *value += noise.sample(rng);
    }
    clamp_to_unit_ball(&mut jittered);
    jittered
}

/// Scale rows so every position lies inside the closed unit ball.
pub(crate) fn clamp_to_unit_ball(positions: &mut Array2<f64>) {
    for mut row in positions.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 1.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

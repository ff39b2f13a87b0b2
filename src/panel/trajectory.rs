//! Polynomial position trajectories across periods.
//!
//! Purpose
//! -------
//! Represent one legislator's drift through the latent space as a
//! D x (order + 1) polynomial coefficient grid over the period index, and
//! fit those coefficients by weighted least squares from period-specific
//! implied positions (weight = valid-ballot count in the period).
//!
//! Key behaviors
//! -------------
//! - The effective order of a fit is capped at `samples - 1`, so a
//!   legislator seen in a single period collapses to a constant (a point)
//!   regardless of the requested model order.
//! - Normal equations are accumulated once per legislator and solved with
//!   a Cholesky factorization shared across dimensions; a singular system
//!   is a typed degeneracy error, not a panic.
//!
//! Invariants & assumptions
//! ------------------------
//! - The time variable is the raw period index (0-based position in the
//!   input sequence); panels are short (a handful of periods) so the
//!   monomial basis stays well conditioned.
//! - Sample weights are non-negative and at least one is positive.
use nalgebra::{Cholesky, DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::scaling::core::votes::LegislatorId;
use crate::scaling::errors::{ScalingError, ScalingResult};

/// Trajectory — one legislator's polynomial drift coefficients.
///
/// `coeffs[(d, p)]` multiplies `t^p` on dimension `d`; `periods` records
/// which period indices the fit drew on.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub legislator: LegislatorId,
    pub coeffs: Array2<f64>,
    pub periods: Vec<usize>,
}

impl Trajectory {
    /// A degree-0 trajectory pinned at one position.
    pub fn constant(legislator: LegislatorId, coords: Array1<f64>, period: usize) -> Self {
        let dims = coords.len();
        let mut coeffs = Array2::zeros((dims, 1));
        coeffs.column_mut(0).assign(&coords);
        Self { legislator, coeffs, periods: vec![period] }
    }

    pub fn dims(&self) -> usize {
        self.coeffs.nrows()
    }

    pub fn order(&self) -> usize {
        self.coeffs.ncols() - 1
    }

    /// Evaluate the trajectory at period index `t` (Horner's scheme).
    pub fn position_at(&self, t: usize) -> Array1<f64> {
        let t = t as f64;
        let mut coords = Array1::zeros(self.dims());
        for d in 0..self.dims() {
            let mut value = 0.0;
            for p in (0..self.coeffs.ncols()).rev() {
                value = value * t + self.coeffs[(d, p)];
            }
            coords[d] = value;
        }
        coords
    }

    /// Negate one dimension's coefficients.
    pub(crate) fn flip_dimension(&mut self, dim: usize) {
        for p in 0..self.coeffs.ncols() {
            self.coeffs[(dim, p)] = -self.coeffs[(dim, p)];
        }
    }
}

/// Fit a weighted polynomial trajectory from implied period positions.
///
/// `samples` holds `(period_index, position, weight)` triples; the
/// requested `order` is capped at `samples.len() - 1`.
///
/// # Errors
/// - [`ScalingError::SingularTrajectoryFit`] when the weighted normal
///   equations have no Cholesky factorization (e.g. all weights zero or
///   duplicate period indices beyond the effective order).
pub fn fit_trajectory(
    legislator: LegislatorId, samples: &[(usize, Array1<f64>, f64)], order: usize,
) -> ScalingResult<Trajectory> {
    if samples.is_empty() {
        return Err(ScalingError::SingularTrajectoryFit { legislator });
    }
    let dims = samples[0].1.len();
    let effective_order = order.min(samples.len() - 1);
    let k = effective_order + 1;

    // Accumulate X'WX once; it is shared by every dimension.
    let mut xtwx = DMatrix::<f64>::zeros(k, k);
    for &(t, _, weight) in samples {
        let basis: Vec<f64> = (0..k).map(|p| (t as f64).powi(p as i32)).collect();
        for a in 0..k {
            for b in 0..k {
                xtwx[(a, b)] += weight * basis[a] * basis[b];
            }
        }
    }
    let factorization = Cholesky::new(xtwx)
        .ok_or(ScalingError::SingularTrajectoryFit { legislator })?;

    let mut coeffs = Array2::zeros((dims, k));
    for d in 0..dims {
        let mut xtwy = DVector::<f64>::zeros(k);
        for &(t, ref position, weight) in samples {
            for (p, slot) in xtwy.iter_mut().enumerate() {
                *slot += weight * (t as f64).powi(p as i32) * position[d];
            }
        }
        let solution = factorization.solve(&xtwy);
        for p in 0..k {
            coeffs[(d, p)] = solution[p];
        }
    }

    let periods = samples.iter().map(|&(t, _, _)| t).collect();
    Ok(Trajectory { legislator, coeffs, periods })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact recovery of linear and quadratic drift from noiseless
    //   samples.
    // - Order capping for thin samples (single period -> a point).
    // - Weight sensitivity and the singular-fit error path.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A linear drift sampled exactly must be recovered exactly, and
    // evaluation must reproduce the samples.
    //
    // Given
    // -----
    // - Positions x(t) = 0.1 + 0.2 t on one dimension at t = 0..3, unit
    //   weights, order 1.
    //
    // Expect
    // ------
    // - Coefficients (0.1, 0.2) within 1e-10; position_at matches.
    fn linear_drift_is_recovered_exactly() {
        // Arrange
        let samples: Vec<(usize, Array1<f64>, f64)> =
            (0..4).map(|t| (t, array![0.1 + 0.2 * t as f64], 1.0)).collect();

        // Act
        let trajectory =
            fit_trajectory(LegislatorId(1), &samples, 1).expect("fit should succeed");

        // Assert
        assert!((trajectory.coeffs[(0, 0)] - 0.1).abs() < 1e-10);
        assert!((trajectory.coeffs[(0, 1)] - 0.2).abs() < 1e-10);
        assert!((trajectory.position_at(3)[0] - 0.7).abs() < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // A quadratic drift needs order 2 and at least 3 samples; given both,
    // recovery is exact across two dimensions.
    //
    // Given
    // -----
    // - x(t) = (1 - t + 0.5 t^2, 0.3 t) at t = 0..4, order 2.
    //
    // Expect
    // ------
    // - All six coefficients within 1e-8 of the truth.
    fn quadratic_drift_is_recovered_across_dimensions() {
        // Arrange
        let samples: Vec<(usize, Array1<f64>, f64)> = (0..5)
            .map(|t| {
                let tf = t as f64;
                (t, array![1.0 - tf + 0.5 * tf * tf, 0.3 * tf], 1.0)
            })
            .collect();

        // Act
        let trajectory =
            fit_trajectory(LegislatorId(2), &samples, 2).expect("fit should succeed");

        // Assert
        let expected = [(0, 0, 1.0), (0, 1, -1.0), (0, 2, 0.5), (1, 0, 0.0), (1, 1, 0.3), (1, 2, 0.0)];
        for (d, p, value) in expected {
            assert!(
                (trajectory.coeffs[(d, p)] - value).abs() < 1e-8,
                "coeff ({d}, {p}) = {}, expected {value}",
                trajectory.coeffs[(d, p)]
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // A single-period legislator must collapse to a degree-0 trajectory
    // whatever order was requested.
    //
    // Given
    // -----
    // - One sample at t = 2, requested order 3.
    //
    // Expect
    // ------
    // - order() == 0 and the position equals the sample everywhere.
    fn single_period_collapses_to_a_point() {
        // Arrange
        let samples = vec![(2usize, array![0.4, -0.2], 5.0)];

        // Act
        let trajectory =
            fit_trajectory(LegislatorId(3), &samples, 3).expect("fit should succeed");

        // Assert
        assert_eq!(trajectory.order(), 0);
        for t in [0usize, 5] {
            let position = trajectory.position_at(t);
            assert!((position[0] - 0.4).abs() < 1e-12);
            assert!((position[1] + 0.2).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Heavier samples must pull a constant fit toward themselves.
    //
    // Given
    // -----
    // - Order-0 fit of positions 0 and 1 with weights 1 and 3.
    //
    // Expect
    // ------
    // - The fitted constant is the weighted mean 0.75.
    fn weights_pull_the_constant_fit() {
        // Arrange
        let samples = vec![(0usize, array![0.0], 1.0), (1usize, array![1.0], 3.0)];

        // Act
        let trajectory =
            fit_trajectory(LegislatorId(4), &samples, 0).expect("fit should succeed");

        // Assert
        assert!((trajectory.coeffs[(0, 0)] - 0.75).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // All-zero weights make the normal equations singular; that must be
    // the typed degeneracy error.
    //
    // Given
    // -----
    // - Two samples with weight 0, and separately an empty sample list.
    //
    // Expect
    // ------
    // - SingularTrajectoryFit in both cases.
    fn degenerate_inputs_yield_singular_fit_error() {
        // Arrange
        let zero_weight = vec![(0usize, array![0.1], 0.0), (1usize, array![0.2], 0.0)];
        let empty: Vec<(usize, Array1<f64>, f64)> = Vec::new();

        // Act & Assert
        assert!(matches!(
            fit_trajectory(LegislatorId(5), &zero_weight, 1),
            Err(ScalingError::SingularTrajectoryFit { legislator: LegislatorId(5) })
        ));
        assert!(matches!(
            fit_trajectory(LegislatorId(5), &empty, 1),
            Err(ScalingError::SingularTrajectoryFit { legislator: LegislatorId(5) })
        ));
    }
}

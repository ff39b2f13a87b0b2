//! Shared model parameters: the error precision β and the dimension
//! weight vector w.
//!
//! The spatial voting model scales kernel distances by per-dimension
//! weights, with the first dimension pinned at weight 1 so the remaining
//! weights are identified relative to it. β multiplies the utility
//! difference before the normal CDF; both are re-optimized jointly on a
//! fixed cadence during the alternating sweeps, inside the bounded windows
//! below.
use ndarray::Array1;

/// Starting error precision (the conventional NOMINATE default).
pub const BETA_START: f64 = 8.8633;

/// Starting weight for every dimension beyond the first.
pub const EXTRA_DIM_WEIGHT_START: f64 = 0.4619;

/// Bounded search window for β.
pub const BETA_BOUNDS: (f64, f64) = (0.5, 30.0);

/// Bounded search window for the free dimension weights.
pub const WEIGHT_BOUNDS: (f64, f64) = (0.05, 1.5);

/// ModelWeights — error precision β plus dimension weights w, w[0] == 1.
///
/// The constructor establishes the invariant; `set_weight` refuses to touch
/// dimension 0, so the invariant survives every update path.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelWeights {
    beta: f64,
    w: Array1<f64>,
}

impl ModelWeights {
    /// Standard starting values for a `dims`-dimensional fit.
    pub fn start(dims: usize) -> Self {
        let mut w = Array1::from_elem(dims, EXTRA_DIM_WEIGHT_START);
        w[0] = 1.0;
        Self { beta: BETA_START, w }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.w
    }

    pub fn dims(&self) -> usize {
        self.w.len()
    }

    /// Replace β, clamped into [`BETA_BOUNDS`].
    pub fn set_beta(&mut self, beta: f64) {
        self.beta = beta.clamp(BETA_BOUNDS.0, BETA_BOUNDS.1);
    }

    /// Replace the weight of dimension `dim`, clamped into
    /// [`WEIGHT_BOUNDS`]. Dimension 0 is pinned and silently ignored.
    pub fn set_weight(&mut self, dim: usize, weight: f64) {
        if dim == 0 || dim >= self.w.len() {
            return;
        }
        self.w[dim] = weight.clamp(WEIGHT_BOUNDS.0, WEIGHT_BOUNDS.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Starting values and the pinned first weight.
    // - Clamping on the β and weight setters.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify start() pins w[0] at 1 and seeds the rest at the conventional
    // extra-dimension weight.
    //
    // Given
    // -----
    // - A 3-dimensional start.
    //
    // Expect
    // ------
    // - beta == BETA_START, w == [1, 0.4619, 0.4619].
    fn start_pins_first_weight() {
        // Act
        let weights = ModelWeights::start(3);

        // Assert
        assert_eq!(weights.beta(), BETA_START);
        assert_eq!(weights.weights()[0], 1.0);
        assert_eq!(weights.weights()[1], EXTRA_DIM_WEIGHT_START);
        assert_eq!(weights.weights()[2], EXTRA_DIM_WEIGHT_START);
    }

    #[test]
    // Purpose
    // -------
    // Ensure setters clamp into their windows and never unpin w[0].
    //
    // Given
    // -----
    // - β pushed above its window, weight 1 pushed below its window, and an
    //   attempted write to weight 0.
    //
    // Expect
    // ------
    // - β lands on the upper β bound, weight 1 on the lower weight bound,
    //   and w[0] stays exactly 1.
    fn setters_clamp_and_preserve_pin() {
        // Arrange
        let mut weights = ModelWeights::start(2);

        // Act
        weights.set_beta(1e6);
        weights.set_weight(1, -4.0);
        weights.set_weight(0, 0.2);

        // Assert
        assert_eq!(weights.beta(), BETA_BOUNDS.1);
        assert_eq!(weights.weights()[1], WEIGHT_BOUNDS.0);
        assert_eq!(weights.weights()[0], 1.0);
    }
}

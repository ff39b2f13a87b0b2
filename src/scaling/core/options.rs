//! Estimation configuration: options for the single-period estimator and
//! the multi-period bridger, plus the polarity-anchor policy.
//!
//! Purpose
//! -------
//! Centralize every externally tunable knob behind validated constructors,
//! so estimation code can assume well-formed settings. Defaults follow the
//! values the production wrappers pass in practice (two dimensions, a 2.5%
//! lopsided screen, ten-ballot minimum).
//!
//! Conventions
//! -----------
//! - The anchor policy is resolved *once* before estimation begins into
//!   concrete row pairs; estimation never branches on the policy inline.
//! - `Pairs` may name fewer pairs than dimensions; unanchored dimensions
//!   keep the sign the optimizer found.
use crate::scaling::core::votes::LegislatorId;
use crate::scaling::errors::{ScalingError, ScalingResult};

/// Expected side of an anchor on one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSign {
    Negative,
    Positive,
}

impl AnchorSign {
    /// The sign as a multiplicative factor.
    pub fn factor(self) -> f64 {
        match self {
            AnchorSign::Negative => -1.0,
            AnchorSign::Positive => 1.0,
        }
    }
}

/// An identity pair fixing one dimension's orientation: the negative
/// anchor's coordinate must end up strictly below the positive anchor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPair {
    pub negative: LegislatorId,
    pub positive: LegislatorId,
}

/// Polarity-anchor policy for the single-period estimator.
///
/// Either explicit identity pairs (one per dimension, in dimension order),
/// or the row fallback: first retained row as the negative anchor, last
/// retained row as the positive anchor, on every dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorPolicy {
    Pairs(Vec<AnchorPair>),
    RowFallback,
}

/// Single global anchor for the bridger: one legislator with an expected
/// sign per dimension. Sign-fixing happens once, globally, so a
/// legislator's trajectory can never flip between periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAnchor {
    pub legislator: LegislatorId,
    /// Expected signs in dimension order; may be shorter than `dims`, in
    /// which case trailing dimensions are left unoriented.
    pub signs: Vec<AnchorSign>,
}

/// ScalingOptions — configuration for one single-period estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingOptions {
    /// Latent dimensionality D (>= 1).
    pub dims: usize,
    /// Minimum valid ballots for a legislator to be placed.
    pub minvotes: usize,
    /// Minority-fraction threshold for the lopsided-vote screen.
    pub lop: f64,
    /// Independent random restarts (>= 1).
    pub trials: usize,
    /// Outer sweep budget per trial.
    pub max_sweeps: usize,
    /// Convergence tolerance on the aggregate log-likelihood increase.
    pub tolerance: f64,
    /// Base seed; trial k perturbs with seed + k.
    pub seed: u64,
    /// Re-optimize beta and the dimension weights every this many sweeps.
    pub weight_update_interval: usize,
    /// Polarity-anchor policy, resolved before estimation.
    pub anchors: AnchorPolicy,
}

impl ScalingOptions {
    /// Construct validated options.
    ///
    /// # Errors
    /// One of the `Invalid*` input errors when a knob is out of range, or
    /// [`ScalingError::TooManyAnchorPairs`] when more pairs than dimensions
    /// are named.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dims: usize, minvotes: usize, lop: f64, trials: usize, max_sweeps: usize, tolerance: f64,
        seed: u64, weight_update_interval: usize, anchors: AnchorPolicy,
    ) -> ScalingResult<Self> {
        if dims == 0 {
            return Err(ScalingError::InvalidDims { dims });
        }
        if !lop.is_finite() || !(0.0..0.5).contains(&lop) {
            return Err(ScalingError::InvalidLop { lop });
        }
        if trials == 0 {
            return Err(ScalingError::InvalidTrials { trials });
        }
        if max_sweeps == 0 {
            return Err(ScalingError::InvalidMaxSweeps { sweeps: max_sweeps });
        }
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ScalingError::InvalidTolerance { tolerance });
        }
        if weight_update_interval == 0 {
            return Err(ScalingError::InvalidWeightInterval { interval: weight_update_interval });
        }
        if let AnchorPolicy::Pairs(pairs) = &anchors {
            if pairs.len() > dims {
                return Err(ScalingError::TooManyAnchorPairs { pairs: pairs.len(), dims });
            }
        }
        Ok(Self {
            dims,
            minvotes,
            lop,
            trials,
            max_sweeps,
            tolerance,
            seed,
            weight_update_interval,
            anchors,
        })
    }
}

impl Default for ScalingOptions {
    fn default() -> Self {
        Self {
            dims: 2,
            minvotes: 10,
            lop: 0.025,
            trials: 3,
            max_sweeps: 30,
            tolerance: 1e-4,
            seed: 0,
            weight_update_interval: 3,
            anchors: AnchorPolicy::RowFallback,
        }
    }
}

/// Highest polynomial order the bridger supports.
pub const MAX_MODEL_ORDER: usize = 3;

/// PanelOptions — configuration for one multi-period estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelOptions {
    /// Per-period settings (filters, dims, sweep budget, tolerance, seed).
    /// `trials` and `anchors` are ignored by the bridger: restarts apply to
    /// single-period fits only, and panel polarity uses `anchor` below.
    pub base: ScalingOptions,
    /// Polynomial drift order o; requires at least o + 2 periods.
    pub model_order: usize,
    /// The single global polarity anchor.
    pub anchor: GlobalAnchor,
}

impl PanelOptions {
    /// Construct validated panel options.
    ///
    /// # Errors
    /// - [`ScalingError::InvalidModelOrder`] for `model_order > 3`.
    /// - [`ScalingError::DimensionOutOfRange`] when the anchor names more
    ///   signs than there are dimensions.
    pub fn new(base: ScalingOptions, model_order: usize, anchor: GlobalAnchor) -> ScalingResult<Self> {
        if model_order > MAX_MODEL_ORDER {
            return Err(ScalingError::InvalidModelOrder { order: model_order });
        }
        if anchor.signs.len() > base.dims {
            return Err(ScalingError::DimensionOutOfRange {
                dimension: anchor.signs.len() - 1,
                dims: base.dims,
            });
        }
        Ok(Self { base, model_order, anchor })
    }

    /// Minimum number of periods this configuration needs.
    pub fn required_periods(&self) -> usize {
        self.model_order + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Range validation for each knob of ScalingOptions.
    // - Anchor-pair count versus dimensionality.
    // - PanelOptions order and anchor-sign validation.
    // -------------------------------------------------------------------------

    fn base_args() -> ScalingOptions {
        ScalingOptions::default()
    }

    #[test]
    // Purpose
    // -------
    // Ensure each out-of-range knob is rejected with its own variant.
    //
    // Given
    // -----
    // - Defaults with one knob at a time pushed out of range.
    //
    // Expect
    // ------
    // - The matching Invalid* error for dims, lop, trials, tolerance,
    //   sweeps, and the weight interval.
    fn each_knob_is_range_checked() {
        let d = base_args();

        // Act & Assert
        assert!(matches!(
            ScalingOptions::new(0, d.minvotes, d.lop, d.trials, d.max_sweeps, d.tolerance, 0, 3,
                AnchorPolicy::RowFallback),
            Err(ScalingError::InvalidDims { dims: 0 })
        ));
        assert!(matches!(
            ScalingOptions::new(2, d.minvotes, 0.5, d.trials, d.max_sweeps, d.tolerance, 0, 3,
                AnchorPolicy::RowFallback),
            Err(ScalingError::InvalidLop { .. })
        ));
        assert!(matches!(
            ScalingOptions::new(2, d.minvotes, d.lop, 0, d.max_sweeps, d.tolerance, 0, 3,
                AnchorPolicy::RowFallback),
            Err(ScalingError::InvalidTrials { trials: 0 })
        ));
        assert!(matches!(
            ScalingOptions::new(2, d.minvotes, d.lop, d.trials, d.max_sweeps, 0.0, 0, 3,
                AnchorPolicy::RowFallback),
            Err(ScalingError::InvalidTolerance { .. })
        ));
        assert!(matches!(
            ScalingOptions::new(2, d.minvotes, d.lop, d.trials, 0, d.tolerance, 0, 3,
                AnchorPolicy::RowFallback),
            Err(ScalingError::InvalidMaxSweeps { sweeps: 0 })
        ));
        assert!(matches!(
            ScalingOptions::new(2, d.minvotes, d.lop, d.trials, d.max_sweeps, d.tolerance, 0, 0,
                AnchorPolicy::RowFallback),
            Err(ScalingError::InvalidWeightInterval { interval: 0 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify more anchor pairs than dimensions is rejected, while fewer is
    // accepted (trailing dimensions stay unanchored).
    //
    // Given
    // -----
    // - dims = 1 with two pairs; dims = 2 with one pair.
    //
    // Expect
    // ------
    // - TooManyAnchorPairs for the former, Ok for the latter.
    fn anchor_pair_count_checked_against_dims() {
        let d = base_args();
        let pair = AnchorPair { negative: LegislatorId(1), positive: LegislatorId(2) };

        // Act & Assert
        assert!(matches!(
            ScalingOptions::new(1, d.minvotes, d.lop, d.trials, d.max_sweeps, d.tolerance, 0, 3,
                AnchorPolicy::Pairs(vec![pair, pair])),
            Err(ScalingError::TooManyAnchorPairs { pairs: 2, dims: 1 })
        ));
        assert!(ScalingOptions::new(2, d.minvotes, d.lop, d.trials, d.max_sweeps, d.tolerance, 0,
            3, AnchorPolicy::Pairs(vec![pair]))
        .is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Check the panel-order gate and the required-period arithmetic.
    //
    // Given
    // -----
    // - model_order = 4 (invalid) and model_order = 2 (valid).
    //
    // Expect
    // ------
    // - InvalidModelOrder for 4; required_periods() == 4 for order 2.
    fn panel_order_gate_and_required_periods() {
        let anchor =
            GlobalAnchor { legislator: LegislatorId(1), signs: vec![AnchorSign::Negative] };

        // Act & Assert
        assert!(matches!(
            PanelOptions::new(base_args(), 4, anchor.clone()),
            Err(ScalingError::InvalidModelOrder { order: 4 })
        ));
        let opts = PanelOptions::new(base_args(), 2, anchor).expect("order 2 should validate");
        assert_eq!(opts.required_periods(), 4);
    }
}

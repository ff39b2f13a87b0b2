//! scaling — single-period ideal-point estimation.
//!
//! Purpose
//! -------
//! Provide the full single-period stack: validated roll-call containers,
//! preprocessing screens, the spatial voting likelihood, the alternating
//! estimator with its pure half-steps, and the trial controller that wraps
//! restarts into one reproducible, reportable fit.
//!
//! Key behaviors
//! -------------
//! - Collect data containers, filters, configuration, likelihood, starting
//!   values, and statistics in [`core`].
//! - Expose the alternating estimator and its half-step problems in
//!   [`models`].
//! - Run seeded restarts with exact max-selection in [`trials`], the
//!   public entry point for single-period estimation.
//! - Centralize the error surface in [`errors`].
//!
//! Conventions
//! -----------
//! - A fixed seed makes a whole estimation bit-for-bit reproducible,
//!   including across the parallel half-steps and trials.
//! - Non-convergence is reported through result flags; errors mean the
//!   estimation could not be attempted or the data degenerated.
//! - This module performs no I/O; warnings and diagnostics go through the
//!   `log` facade from orchestration code only.
//!
//! Downstream usage
//! ----------------
//! - Single-period callers use [`estimate`] with a [`RollCallMatrix`] and
//!   [`ScalingOptions`].
//! - The multi-period bridger in [`crate::panel`] reuses the half-steps,
//!   filters, and likelihood from here, driving them per period.
//! - The post-hoc group-mean polarity pass in [`crate::polarity`] operates
//!   on the fitted artifacts this module produces.

pub mod core;
pub mod errors;
pub mod models;
pub mod trials;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    AnchorPair, AnchorPolicy, AnchorSign, BillPoints, Exclusion, FitStats, GlobalAnchor,
    IdealPoint, LegislatorId, LegislatorRegistry, ModelWeights, PanelOptions, RollCallMatrix,
    ScalingOptions, VoteChoice, VoteId,
};
pub use self::errors::{ScalingError, ScalingResult};
pub use self::trials::{estimate, NominateFit, TrialSummary};

//! rollcall_scaling — ideal-point estimation from roll-call voting records.
//!
//! Purpose
//! -------
//! Estimate legislators' latent ideological positions from Yea/Nay voting
//! records: single-period alternating maximum-likelihood estimation with
//! random restarts, multi-period trajectory bridging with polynomial
//! drift, and two polarity-resolution mechanisms for the model's inherent
//! sign indeterminacy.
//!
//! Key behaviors
//! -------------
//! - [`scaling`]: validated roll-call containers, lopsided/minimum-ballot
//!   preprocessing with exclusion reporting, the Gaussian-kernel
//!   random-utility likelihood, spectral starts, the alternating
//!   estimator with parallel half-steps, and the seeded trial controller
//!   ([`scaling::estimate`]).
//! - [`panel`]: the multi-period bridger ([`panel::estimate_panel`]) with
//!   weighted polynomial trajectories, shared β / dimension weights, and
//!   a single global sign fix.
//! - [`polarity`]: the independent post-hoc group-mean orientation pass.
//! - [`optimization`]: the shared L-BFGS and bounded-line-search plumbing
//!   every half-step runs on.
//!
//! Invariants & assumptions
//! ------------------------
//! - Data extraction, CSV/file I/O, plotting, and CLI parsing live in the
//!   surrounding tooling; this crate consumes built [`scaling::RollCallMatrix`]
//!   values and returns plain result structs for the exporter.
//! - Only Yea/Nay ballots enter any likelihood; abstention and missing
//!   cells are carried but inert.
//! - For a fixed seed, every estimation is deterministic, including
//!   across the internal parallelism.
//! - Failure to converge within the sweep budget is reported through
//!   result flags, never as an error; structural and data-sufficiency
//!   problems abort with typed [`scaling::ScalingError`] values.
//!
//! Downstream usage
//! ----------------
//! - Single period: build a matrix, configure [`scaling::ScalingOptions`]
//!   (dimensions, filters, trials, anchors, seed), call
//!   [`scaling::estimate`], export the returned points/bills/statistics.
//! - Multi period: supply ordered matrices and [`scaling::PanelOptions`]
//!   (model order, global anchor) to [`panel::estimate_panel`].
//! - When anchors are unavailable or disagree with known group
//!   semantics, apply [`polarity::orient_by_groups`] to the finished
//!   artifacts.

pub mod optimization;
pub mod panel;
pub mod polarity;
pub mod scaling;

// ---- Re-exports (primary public surface) ----------------------------------

pub use crate::panel::{estimate_panel, PanelFit, Trajectory};
pub use crate::polarity::{orient_by_groups, GroupOrientation, GroupSpec};
pub use crate::scaling::{
    estimate, AnchorPair, AnchorPolicy, AnchorSign, BillPoints, Exclusion, FitStats, GlobalAnchor,
    IdealPoint, LegislatorId, NominateFit, PanelOptions, RollCallMatrix, ScalingError,
    ScalingOptions, ScalingResult, TrialSummary, VoteChoice, VoteId,
};

//! scaling::core — data containers, filters, likelihood, and shared
//! parameters for ideal-point estimation.
//!
//! Purpose
//! -------
//! Collect the numerical and structural building blocks the estimators sit
//! on: validated roll-call matrices and identifiers ([`votes`]), the
//! cross-period legislator registry ([`registry`]), preprocessing screens
//! with exclusion records ([`filter`]), validated configuration
//! ([`options`]), the spatial voting likelihood ([`likelihood`]), shared
//! β / dimension-weight parameters ([`weights`]), spectral starting
//! configurations ([`init`]), fitted-artifact containers ([`params`]), and
//! fit statistics ([`stats`]).
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; matrix rows are legislators, columns are votes.
//! - Containers validate on construction and are immutable afterwards;
//!   the hot likelihood loops assume alignment rather than re-checking it.
//! - This layer performs no I/O and no logging; orchestration code above
//!   it reports warnings and progress.

pub mod filter;
pub mod init;
pub mod likelihood;
pub mod options;
pub mod params;
pub mod registry;
pub mod stats;
pub mod votes;
pub mod weights;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::filter::{Exclusion, FilteredMatrix, ensure_estimable, filter_matrix};
pub use self::options::{
    AnchorPair, AnchorPolicy, AnchorSign, GlobalAnchor, PanelOptions, ScalingOptions,
};
pub use self::params::{BillPoints, IdealPoint};
pub use self::registry::{LegislatorRecord, LegislatorRegistry, PeriodPresence};
pub use self::stats::{FitStats, fit_stats};
pub use self::votes::{LegislatorId, RollCallMatrix, VoteChoice, VoteId};
pub use self::weights::ModelWeights;

//! panel — multi-period trajectory bridging.
//!
//! Purpose
//! -------
//! Estimate legislator drift across an ordered sequence of periods:
//! polynomial [`Trajectory`] fitting per legislator in [`trajectory`], and
//! the outer alternating loop with shared β / weights and a single global
//! sign fix in [`bridger`].
//!
//! Conventions
//! -----------
//! - The time variable is the 0-based position of a period in the input
//!   sequence; period labels are carried through for reporting only.
//! - All cross-period identity goes through the legislator registry; there
//!   is no per-period re-matching.

pub mod bridger;
pub mod trajectory;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bridger::{estimate_panel, PanelFit};
pub use self::trajectory::{fit_trajectory, Trajectory};

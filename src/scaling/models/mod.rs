//! scaling::models — the alternating estimator and its half-steps.
//!
//! [`steps`] holds the pure bill-step and legislator-step functions;
//! [`nominate`] drives them through alternating sweeps with periodic
//! β / weight re-optimization and anchor-based sign fixing. The trial
//! controller in [`crate::scaling::trials`] is the public entry point.

pub mod nominate;
pub mod steps;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::steps::{fit_bill, fit_legislator, initial_bill_points, BillStep, LegislatorStep};

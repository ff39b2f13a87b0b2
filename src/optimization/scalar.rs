//! Bounded scalar maximization for the β and dimension-weight updates.
//!
//! The joint precision/weight re-optimization is a sequence of bounded
//! one-dimensional searches over the aggregate log-likelihood. This module
//! wraps argmin's golden-section solver behind the same negate-and-minimize
//! convention as the vector path in [`loglik`](crate::optimization::loglik).
use crate::optimization::errors::{OptError, OptResult};
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::goldensectionsearch::GoldenSectionSearch;

/// Default relative tolerance for golden-section searches.
pub const SCALAR_TOL: f64 = 1e-4;

/// Default iteration cap for golden-section searches.
pub const SCALAR_MAX_ITERS: u64 = 64;

/// Adapter exposing `x -> -f(x)` to argmin.
struct NegScalar<'a, G: Fn(f64) -> f64> {
    f: &'a G,
}

impl<'a, G: Fn(f64) -> f64> CostFunction for NegScalar<'a, G> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let value = (self.f)(*x);
        if !value.is_finite() {
            return Err((OptError::NonFiniteObjective { value }).into());
        }
        Ok(-value)
    }
}

/// Maximize `f` over the closed interval `[lo, hi]`.
///
/// `init` is the starting abscissa and is clamped into the interval. The
/// returned value is the best abscissa found by a golden-section search.
///
/// # Errors
/// - [`OptError::InvalidInterval`] when the bounds are non-finite or
///   `lo >= hi`.
/// - Any solver error, including non-finite objective values.
pub fn maximize_on_interval<G: Fn(f64) -> f64>(
    f: &G, lo: f64, hi: f64, init: f64,
) -> OptResult<f64> {
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(OptError::InvalidInterval { lo, hi });
    }
    let start = init.clamp(lo, hi);
    let problem = NegScalar { f };
    let solver = GoldenSectionSearch::new(lo, hi)?.with_tolerance(SCALAR_TOL)?;
    let executor = Executor::new(problem, solver)
        .configure(|state| state.param(start).max_iters(SCALAR_MAX_ITERS));

    let result = executor.run()?.state().clone();
    result.get_best_param().copied().ok_or(OptError::MissingBestParam)
}

//! Log-likelihood maximization over small parameter vectors.
//!
//! Purpose
//! -------
//! Provide the solver plumbing shared by every half-step in the crate: a
//! [`LogLik`] trait the estimation problems implement, an adapter that turns
//! a maximization of ℓ(θ) into an argmin minimization of `c(θ) = -ℓ(θ)`,
//! and a runner that wires up L-BFGS with a More-Thuente line search and
//! normalizes the result into a [`StepFit`].
//!
//! Key behaviors
//! -------------
//! - Negate user log-likelihoods (and analytic gradients, when provided)
//!   so argmin's minimizers apply unchanged.
//! - Fall back to central finite differences of the cost when a problem does
//!   not implement `grad`, capturing any evaluation failure raised inside
//!   the difference stencil.
//! - Validate solver output: the best parameter must exist and be finite,
//!   and the reported objective must be finite.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter vectors are dense `ndarray` arrays of `f64`; problems are
//!   cheap to evaluate many times (the half-steps here have 1-8 free
//!   parameters each).
//! - `StepFit::loglik` is reported in log-likelihood space, not cost space.
//! - Problems are immutable during a solve; all mutation happens in the
//!   sweep loop that owns them.
//!
//! Downstream usage
//! ----------------
//! - `scaling::models::steps` implements [`LogLik`] for the bill and
//!   legislator half-step problems and calls [`maximize`] per unit.
//! - The β / dimension-weight line searches use the sibling `scalar`
//!   module instead; only vector-valued problems come through here.
use std::cell::RefCell;

use crate::optimization::errors::{OptError, OptResult};
use argmin::core::{CostFunction, Error, Executor, Gradient, State, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use finitediff::FiniteDiff;
use ndarray::Array1;

/// Parameter vector θ for log-likelihood optimization.
pub type Theta = Array1<f64>;

/// Gradient vector matching the shape of [`Theta`].
pub type Grad = Array1<f64>;

/// More-Thuente line search specialized to this crate's numeric types.
type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, f64>;

/// L-BFGS solver wired to the More-Thuente line search.
type LbfgsSolver = LBFGS<MoreThuenteLS, Theta, Grad, f64>;

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)`; the adapter flips the sign to match the cost.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<f64>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject obviously invalid
///   `θ`/`data` pairs before optimization starts.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   When absent, central finite differences of the cost are used.
pub trait LogLik {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Solver settings for one half-step maximization.
///
/// - `tol_cost`: stop when the change in cost falls below this threshold.
/// - `max_iters`: hard cap on L-BFGS iterations.
/// - `memory`: L-BFGS history size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOptions {
    pub tol_cost: f64,
    pub max_iters: u64,
    pub memory: usize,
}

impl StepOptions {
    /// Construct validated step options.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolerance`] for non-finite or non-positive `tol_cost`.
    /// - [`OptError::InvalidMemory`] for `memory == 0`.
    pub fn new(tol_cost: f64, max_iters: u64, memory: usize) -> OptResult<Self> {
        if !tol_cost.is_finite() || tol_cost <= 0.0 {
            return Err(OptError::InvalidTolerance { tol: tol_cost });
        }
        if memory == 0 {
            return Err(OptError::InvalidMemory { mem: memory });
        }
        Ok(Self { tol_cost, max_iters, memory })
    }
}

impl Default for StepOptions {
    fn default() -> Self {
        Self { tol_cost: 1e-7, max_iters: 60, memory: 5 }
    }
}

/// Normalized result of one maximization.
///
/// - `theta`: best parameter vector found (validated finite).
/// - `loglik`: best log-likelihood value `ℓ(θ̂)` (not the cost).
/// - `terminated`: `true` when the solver reported any terminating status.
/// - `iterations`: solver iterations performed.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFit {
    pub theta: Theta,
    pub loglik: f64,
    pub terminated: bool,
    pub iterations: u64,
}

impl StepFit {
    fn from_state(
        theta_opt: Option<Theta>, loglik: f64, status: &TerminationStatus, iterations: u64,
    ) -> OptResult<Self> {
        let theta = theta_opt.ok_or(OptError::MissingBestParam)?;
        for (index, &value) in theta.iter().enumerate() {
            if !value.is_finite() {
                return Err(OptError::NonFiniteBestParam { index, value });
            }
        }
        if !loglik.is_finite() {
            return Err(OptError::NonFiniteObjective { value: loglik });
        }
        let terminated = !matches!(status, TerminationStatus::NotTerminated);
        Ok(Self { theta, loglik, terminated, iterations })
    }
}

/// Bridges a [`LogLik`] problem to argmin's `CostFunction` and `Gradient`.
///
/// `cost` returns `-ℓ(θ)`; `gradient` returns `-∇ℓ(θ)` for analytic
/// gradients or a finite-difference gradient of the cost otherwise.
pub struct NegLogLik<'a, F: LogLik> {
    f: &'a F,
    data: &'a F::Data,
}

impl<'a, F: LogLik> NegLogLik<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLik> CostFunction for NegLogLik<'a, F> {
    type Param = Theta;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(theta, self.data)?;
        if !value.is_finite() {
            return Err((OptError::NonFiniteObjective { value }).into());
        }
        Ok(-value)
    }
}

impl<'a, F: LogLik> Gradient for NegLogLik<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                // The FD closure cannot return Result; capture the first
                // evaluation failure and surface it after the stencil.
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |t: &Theta| -> f64 {
                    match self.cost(t) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if let Some(err) = closure_err.take() {
                    return Err(err);
                }
                validate_grad(&fd_grad, dim)?;
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Maximize `ℓ(θ)` for one problem starting from `theta0`.
///
/// Runs `check`, then L-BFGS with More-Thuente line search, applying the
/// cost-change tolerance and iteration cap from `opts`. Returns the
/// normalized [`StepFit`] with the best parameter and its log-likelihood.
///
/// # Errors
/// - Propagates `check` failures and any solver or validation error.
pub fn maximize<F: LogLik>(
    f: &F, data: &F::Data, theta0: Theta, opts: &StepOptions,
) -> OptResult<StepFit> {
    f.check(&theta0, data)?;
    let problem = NegLogLik::new(f, data);
    let solver: LbfgsSolver =
        LBFGS::new(MoreThuenteLS::new(), opts.memory).with_tolerance_cost(opts.tol_cost)?;
    let executor = Executor::new(problem, solver)
        .configure(|state| state.param(theta0).max_iters(opts.max_iters));

    let mut result = executor.run()?.state().clone();
    let iterations = result.get_iter();
    let termination = result.get_termination_status().clone();
    let best_cost = result.get_best_cost();
    StepFit::from_state(result.take_best_param(), -best_cost, &termination, iterations)
}

/// Check that a gradient has the expected length and finite entries.
fn validate_grad(grad: &Grad, expected: usize) -> OptResult<()> {
    if grad.len() != expected {
        return Err(OptError::GradientDimMismatch { expected, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::NonFiniteGradient { index, value });
        }
    }
    Ok(())
}

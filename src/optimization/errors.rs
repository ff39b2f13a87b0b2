use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that finite differences should be used.
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite.
    NonFiniteGradient {
        index: usize,
        value: f64,
    },

    // ---- Objective ----
    /// Objective returned a non-finite value.
    NonFiniteObjective {
        value: f64,
    },

    /// Parameter vector handed to the objective has non-finite entries.
    NonFiniteParam {
        index: usize,
        value: f64,
    },

    /// Parameter vector has the wrong length for the problem.
    ParamLengthMismatch {
        expected: usize,
        actual: usize,
    },

    // ---- Configuration ----
    /// Convergence tolerance needs to be positive and finite.
    InvalidTolerance {
        tol: f64,
    },

    /// L-BFGS memory needs to be at least 1.
    InvalidMemory {
        mem: usize,
    },

    /// Scalar search interval must satisfy lo < hi with finite bounds.
    InvalidInterval {
        lo: f64,
        hi: f64,
    },

    // ---- Solver outcome ----
    /// Solver finished without producing a best parameter.
    MissingBestParam,

    /// Best parameter reported by the solver has non-finite entries.
    NonFiniteBestParam {
        index: usize,
        value: f64,
    },

    // ---- Argmin bridge ----
    /// Typed argmin failure (invalid parameter, uninitialized state, ...).
    Solver {
        text: String,
    },

    /// Any other backend failure surfaced by argmin.
    Backend {
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Analytic gradient not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::NonFiniteGradient { index, value } => {
                write!(f, "Non-finite gradient entry at index {index}: {value}")
            }

            // ---- Objective ----
            OptError::NonFiniteObjective { value } => {
                write!(f, "Objective returned a non-finite value: {value}")
            }
            OptError::NonFiniteParam { index, value } => {
                write!(f, "Non-finite parameter entry at index {index}: {value}")
            }
            OptError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter length mismatch: expected {expected}, actual {actual}")
            }

            // ---- Configuration ----
            OptError::InvalidTolerance { tol } => {
                write!(f, "Invalid tolerance {tol}: must be finite and > 0")
            }
            OptError::InvalidMemory { mem } => {
                write!(f, "Invalid L-BFGS memory {mem}: must be at least 1")
            }
            OptError::InvalidInterval { lo, hi } => {
                write!(f, "Invalid search interval [{lo}, {hi}]: bounds must be finite with lo < hi")
            }

            // ---- Solver outcome ----
            OptError::MissingBestParam => {
                write!(f, "Solver finished without a best parameter vector")
            }
            OptError::NonFiniteBestParam { index, value } => {
                write!(f, "Non-finite best parameter at index {index}: {value}")
            }

            // ---- Argmin bridge ----
            OptError::Solver { text } => {
                write!(f, "Solver error: {text}")
            }
            OptError::Backend { text } => {
                write!(f, "Backend error: {text}")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => OptError::Solver { text: argmin_err.to_string() },
            Err(err) => match err.downcast::<OptError>() {
                Ok(opt_err) => opt_err,
                Err(other) => OptError::Backend { text: other.to_string() },
            },
        }
    }
}

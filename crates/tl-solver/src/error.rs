//! Error types for trim and linearization.

use thiserror::Error;
use tl_core::TlError;
use tl_plant::PlantError;

/// Outcome of a single cost evaluation.
///
/// The optimizer turns `Diverged` and `OutOfBounds` into an infinite cost and
/// keeps going; `Fatal` stops the search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Evaluation diverged: {what}")]
    Diverged { what: String },

    #[error("Candidate outside bounds: {what}")]
    OutOfBounds { what: String },

    #[error("Fatal evaluation fault: {what}")]
    Fatal { what: String },
}

pub type EvalResult<T> = Result<T, EvalError>;

impl From<PlantError> for EvalError {
    fn from(e: PlantError) -> Self {
        match e {
            PlantError::Diverged { what } => EvalError::Diverged { what },
            other => EvalError::Fatal {
                what: other.to_string(),
            },
        }
    }
}

/// Errors surfaced by the optimizer and the linearization engine.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Evaluation error: {what}")]
    Evaluation { what: String },

    #[error("Out of bounds: {what}")]
    OutOfBounds { what: String },

    #[error("Trim did not converge after {iterations} iterations (cost = {cost:e})")]
    ConvergenceFailure { iterations: usize, cost: f64 },

    #[error("Fatal fault: {what}")]
    Fatal { what: String },

    #[error("Optimizer has not terminated (status: {status})")]
    NotTerminal { status: String },

    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Plant error: {0}")]
    Plant(#[from] PlantError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<EvalError> for SolverError {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::Diverged { what } => SolverError::Evaluation { what },
            EvalError::OutOfBounds { what } => SolverError::OutOfBounds { what },
            EvalError::Fatal { what } => SolverError::Fatal { what },
        }
    }
}

impl From<TlError> for SolverError {
    fn from(e: TlError) -> Self {
        match e {
            TlError::DimensionMismatch {
                what,
                expected,
                got,
            } => SolverError::DimensionMismatch {
                what,
                expected,
                got,
            },
            other => SolverError::Configuration {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_divergence_is_recoverable() {
        let e: EvalError = PlantError::Diverged {
            what: "Vt = NaN".into(),
        }
        .into();
        assert!(matches!(e, EvalError::Diverged { .. }));

        let e: EvalError = PlantError::UnknownQuantity { name: "Vt".into() }.into();
        assert!(matches!(e, EvalError::Fatal { .. }));
    }
}

//! Error types for the tl-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read run config: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Plant error: {0}")]
    Plant(String),

    #[error("Solver error: {0}")]
    Solver(String),

    /// The search stopped on a fatal evaluation fault. `best` is the lowest
    /// cost vertex found before the fault, if any cost was finite.
    #[error("Trim aborted: {what}")]
    TrimFault {
        what: String,
        best: Option<tl_solver::TrimSolution>,
    },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tl_sim::SimError> for AppError {
    fn from(err: tl_sim::SimError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<tl_plant::PlantError> for AppError {
    fn from(err: tl_plant::PlantError) -> Self {
        AppError::Plant(err.to_string())
    }
}

impl From<tl_solver::SolverError> for AppError {
    fn from(err: tl_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<tl_results::ResultsError> for AppError {
    fn from(err: tl_results::ResultsError) -> Self {
        match err {
            tl_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

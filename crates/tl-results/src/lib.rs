//! tl-results: linear model output and the trim run store.

pub mod format;
pub mod hash;
pub mod script;
pub mod store;
pub mod types;

pub use format::{MatrixFormat, Notation, format_matrix, format_scalar, format_vector};
pub use hash::compute_run_id;
pub use script::{DEFAULT_SCRIPT_EXTENSION, render_scilab_script, script_path, write_scilab_script};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}

//! Shared application service layer for trimlin.
//!
//! Turns a [`RunConfig`] into a trimmed, linearized model: loads the aircraft
//! from the catalog, runs the simplex trim with checkpointing, linearizes
//! about the trim point, writes the script and records the run.

pub mod config;
pub mod error;
pub mod progress;
pub mod run_service;

pub use config::{
    BoundsPolicyConfig, FlightConfig, LinearizationConfig, ModeConfig, OutputConfig, RunConfig,
    SolverSettings, parse_vector,
};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, TrimProgress};
pub use run_service::{
    SOLVER_VERSION, TrimRunResponse, default_inputs, default_states, list_runs, load_catalog,
    load_run, run_trim, run_trim_with_progress,
};

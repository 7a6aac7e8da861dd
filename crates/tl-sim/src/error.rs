//! Error types for the surrogate plant.

use thiserror::Error;
use tl_plant::PlantError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    #[error("Unknown model: {name} (available: {available})")]
    UnknownModel { name: String, available: String },

    #[error("Invalid model definition {model}: {what}")]
    InvalidModel { model: String, what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<SimError> for PlantError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::NonPhysical { what } => PlantError::Diverged { what },
            other => PlantError::Backend {
                message: other.to_string(),
            },
        }
    }
}

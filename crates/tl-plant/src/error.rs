//! Error types for plant access.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlantError {
    #[error("Unknown quantity: {name}")]
    UnknownQuantity { name: String },

    #[error("Quantity is read-only: {name}")]
    ReadOnly { name: String },

    #[error("Duplicate component in vector: {name}")]
    DuplicateComponent { name: String },

    #[error("Length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Plant diverged: {what}")]
    Diverged { what: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type PlantResult<T> = Result<T, PlantError>;

impl From<tl_core::TlError> for PlantError {
    fn from(e: tl_core::TlError) -> Self {
        match e {
            tl_core::TlError::NonFinite { what, value } => PlantError::Diverged {
                what: format!("{what} = {value}"),
            },
            other => PlantError::Backend {
                message: other.to_string(),
            },
        }
    }
}

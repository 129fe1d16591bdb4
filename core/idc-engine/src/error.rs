//! FILENAME: core/idc-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdcError {
    /// Invalid cube or technique configuration. Fatal at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dimension mismatch: cube has {expected} axes, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index {index} out of bounds on axis {axis} (length {len})")]
    IndexOutOfBounds { axis: usize, index: usize, len: usize },

    #[error("Shared cube lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, IdcError>;

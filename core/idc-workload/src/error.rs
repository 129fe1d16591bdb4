//! FILENAME: core/idc-workload/src/error.rs

use idc_engine::IdcError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Cube error: {0}")]
    Cube(#[from] IdcError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generator or benchmark parameter that cannot produce a workload.
    #[error("Invalid workload: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, WorkloadError>;

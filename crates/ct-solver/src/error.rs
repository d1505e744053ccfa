//! Error types for train solving.
//!
//! Search and policy code returns `ProcessResult` so categorical process
//! errors (`RateTooHigh`, `OutsideCapacity`, ...) reach the solver that
//! branches on them. `SolverError` is the caller-facing error of the
//! orchestrators.

use ct_core::CtError;
use ct_process::ProcessError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Train setup error: {what}")]
    Setup { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<CtError> for SolverError {
    fn from(e: CtError) -> Self {
        SolverError::Process(e.into())
    }
}

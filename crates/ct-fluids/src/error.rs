//! Fluid property errors.

use ct_core::CtError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Value out of valid range.
    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operation not supported (e.g., mixtures, unsupported species).
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Backend (CoolProp) error.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Convergence failure (e.g., solving for T given P,h).
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },
}

impl From<CtError> for FluidError {
    fn from(err: CtError) -> Self {
        match err {
            CtError::NonFinite { what, .. } => FluidError::NonPhysical { what },
            CtError::InvalidArg { what } => FluidError::InvalidArg { what },
            CtError::InvalidBoundary { .. } => FluidError::InvalidArg { what: "boundary" },
            CtError::IndexOob { what, .. } => FluidError::OutOfRange { what },
        }
    }
}

//! Error types for process propagation.
//!
//! `RateTooLow`, `RateTooHigh` and `OutsideCapacity` are categorical: the
//! solvers branch on them. Everything else is a plain propagation failure.

use ct_core::CtError;
use ct_fluids::FluidError;
use thiserror::Error;

pub type ProcessResult<T> = Result<T, ProcessError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    /// Operating point below the minimum-flow (surge) envelope.
    #[error("Rate too low in {unit}: {actual_rate:.3} Am³/h < minimum {minimum_rate:.3} Am³/h")]
    RateTooLow {
        unit: String,
        actual_rate: f64,
        minimum_rate: f64,
    },

    /// Operating point above the maximum-flow (stonewall) envelope.
    #[error("Rate too high in {unit}: {actual_rate:.3} Am³/h > maximum {maximum_rate:.3} Am³/h")]
    RateTooHigh {
        unit: String,
        actual_rate: f64,
        maximum_rate: f64,
    },

    /// No feasible configuration exists within the allowed boundary.
    #[error("Outside capacity: {what}")]
    OutsideCapacity { what: &'static str },

    #[error("Shaft speed not set")]
    SpeedNotSet,

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Fluid model error: {0}")]
    Fluid(#[from] FluidError),
}

impl ProcessError {
    pub fn is_rate_too_low(&self) -> bool {
        matches!(self, ProcessError::RateTooLow { .. })
    }

    pub fn is_rate_too_high(&self) -> bool {
        matches!(self, ProcessError::RateTooHigh { .. })
    }

    pub fn is_outside_capacity(&self) -> bool {
        matches!(self, ProcessError::OutsideCapacity { .. })
    }
}

impl From<CtError> for ProcessError {
    fn from(err: CtError) -> Self {
        match err {
            CtError::NonFinite { what, .. } => ProcessError::NonPhysical { what },
            CtError::InvalidArg { what } => ProcessError::InvalidArg { what },
            CtError::InvalidBoundary { .. } => ProcessError::InvalidArg { what: "boundary" },
            CtError::IndexOob { what, .. } => ProcessError::InvalidArg { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProcessError::RateTooLow {
            unit: "stage 1".into(),
            actual_rate: 500.0,
            minimum_rate: 750.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("stage 1"));
        assert!(msg.contains("750.000"));
    }

    #[test]
    fn classification_helpers() {
        let low = ProcessError::RateTooLow {
            unit: "s".into(),
            actual_rate: 1.0,
            minimum_rate: 2.0,
        };
        let high = ProcessError::RateTooHigh {
            unit: "s".into(),
            actual_rate: 3.0,
            maximum_rate: 2.0,
        };
        let outside = ProcessError::OutsideCapacity { what: "asv" };

        assert!(low.is_rate_too_low() && !low.is_rate_too_high());
        assert!(high.is_rate_too_high() && !high.is_outside_capacity());
        assert!(outside.is_outside_capacity() && !outside.is_rate_too_low());
        assert!(!ProcessError::SpeedNotSet.is_rate_too_low());
    }

    #[test]
    fn fluid_error_converts() {
        let err: ProcessError = FluidError::OutOfRange { what: "enthalpy" }.into();
        assert!(matches!(err, ProcessError::Fluid(_)));
    }
}

use thiserror::Error;

pub type CtResult<T> = Result<T, CtError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CtError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid boundary: min={min} > max={max}")]
    InvalidBoundary { min: f64, max: f64 },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

//! ct-core: stable foundation for trainflow.
//!
//! Contains:
//! - units (uom SI types + constructors, bara helpers, standard conditions)
//! - numeric (Real + tolerances + float helpers)
//! - boundary (closed intervals and target-with-tolerance constraints)
//! - ids (stable compact IDs for loops, chokes and stages)
//! - error (shared error types)

pub mod boundary;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use boundary::{Boundary, FloatConstraint};
pub use error::{CtError, CtResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;

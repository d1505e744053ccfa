//! Core trait for process units.

use crate::error::ProcessResult;
use crate::state::ProcessState;
use ct_core::units::{Power, watt};
use ct_fluids::FluidStream;

/// A step in a process pipeline: takes an inlet stream, returns an outlet stream.
///
/// Units are deterministic functions of the inlet and the session state. They
/// never mutate `ProcessState`; solvers set speed, loop rates and chokes before
/// calling `propagate`.
pub trait ProcessUnit: Send + Sync {
    /// Unit name for debugging and error messages.
    fn name(&self) -> &str;

    fn propagate(&self, inlet: &FluidStream, state: &ProcessState)
    -> ProcessResult<FluidStream>;

    /// Shaft power absorbed by the unit for this inlet.
    ///
    /// Positive means power added to the fluid. Units without rotating
    /// machinery return 0 W.
    fn shaft_power(&self, _inlet: &FluidStream, _state: &ProcessState) -> ProcessResult<Power> {
        Ok(watt(0.0))
    }

    /// Largest standard rate [Sm³/day] the unit can take at this inlet's
    /// conditions and the current speed, if it has a capacity limit.
    fn maximum_standard_rate(
        &self,
        _inlet: &FluidStream,
        _state: &ProcessState,
    ) -> ProcessResult<Option<f64>> {
        Ok(None)
    }
}

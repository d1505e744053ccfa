//! What policies see of a train: configuration in, stream out.

use crate::configuration::PressureControlConfiguration;
use ct_core::Boundary;
use ct_fluids::FluidStream;
use ct_process::ProcessResult;

/// A train bound to one inlet stream.
///
/// Every evaluation applies the whole configuration before propagating, so
/// results do not depend on call order.
pub trait SystemEvaluator {
    fn inlet(&self) -> &FluidStream;

    fn loop_count(&self) -> usize;

    /// Allowed recirculation for loop `loop_index`, given the upstream part of
    /// `configuration`.
    fn recirculation_boundary(
        &mut self,
        loop_index: usize,
        configuration: &PressureControlConfiguration,
    ) -> ProcessResult<Boundary>;

    /// Train outlet.
    fn evaluate(
        &mut self,
        configuration: &PressureControlConfiguration,
    ) -> ProcessResult<FluidStream>;

    /// Outlet of loop `loop_index`, skipping everything downstream of it.
    fn evaluate_through_loop(
        &mut self,
        configuration: &PressureControlConfiguration,
        loop_index: usize,
    ) -> ProcessResult<FluidStream>;
}

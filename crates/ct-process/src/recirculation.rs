//! Anti-surge recirculation loop around a process system.

use crate::error::ProcessResult;
use crate::state::ProcessState;
use crate::system::ProcessSystem;
use crate::unit::ProcessUnit;
use ct_core::units::Power;
use ct_core::{Boundary, LoopId};
use ct_fluids::FluidStream;

/// Wraps an inner system and recycles part of its outlet back to its inlet.
///
/// The loop rate (read from `ProcessState`) is added to the inlet standard
/// rate before the inner system runs; the outlet leaves at the original rate.
/// Zero recirculation is a pass-through. Recirculation only ever adds flow, so
/// a `RateTooHigh` from the inner system cannot be cured here.
#[derive(Debug)]
pub struct RecirculationLoop {
    name: String,
    id: LoopId,
    inner: ProcessSystem,
    maximum_recirculation_rate: Option<f64>,
}

impl RecirculationLoop {
    pub fn new(name: impl Into<String>, id: LoopId, inner: ProcessSystem) -> Self {
        Self {
            name: name.into(),
            id,
            inner,
            maximum_recirculation_rate: None,
        }
    }

    /// Cap on the loop rate [Sm³/day], e.g. the ASV capacity.
    pub fn with_maximum_recirculation_rate(mut self, rate: f64) -> Self {
        self.maximum_recirculation_rate = Some(rate.max(0.0));
        self
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn inner(&self) -> &ProcessSystem {
        &self.inner
    }

    fn mixed_inlet(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<FluidStream> {
        let rate = state.recirculation_rate(self.id)?;
        if rate == 0.0 {
            return Ok(inlet.clone());
        }
        Ok(inlet.with_standard_rate(inlet.standard_rate() + rate)?)
    }

    /// Allowed loop rates `[0, max]` at the current speed.
    ///
    /// `max` is the stonewall standard rate of the first stage inside the loop
    /// less the loop inlet rate, never negative, capped by the configured
    /// maximum. Without any capacity limit inside the loop, the configured
    /// maximum alone applies (zero if none).
    pub fn recirculation_boundary(
        &self,
        inlet: &FluidStream,
        state: &ProcessState,
    ) -> ProcessResult<Boundary> {
        let headroom = self
            .inner
            .maximum_standard_rate(inlet, state)?
            .map(|max_rate| (max_rate - inlet.standard_rate()).max(0.0));
        let max = match (headroom, self.maximum_recirculation_rate) {
            (Some(h), Some(cap)) => h.min(cap),
            (Some(h), None) => h,
            (None, Some(cap)) => cap,
            (None, None) => 0.0,
        };
        Ok(Boundary::new(0.0, max)?)
    }
}

impl ProcessUnit for RecirculationLoop {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<FluidStream> {
        let mixed = self.mixed_inlet(inlet, state)?;
        let outlet = self.inner.propagate(&mixed, state)?;
        Ok(outlet.with_standard_rate(inlet.standard_rate())?)
    }

    fn shaft_power(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<Power> {
        let mixed = self.mixed_inlet(inlet, state)?;
        self.inner.shaft_power(&mixed, state)
    }

    fn maximum_standard_rate(
        &self,
        inlet: &FluidStream,
        state: &ProcessState,
    ) -> ProcessResult<Option<f64>> {
        self.inner.maximum_standard_rate(inlet, state)
    }
}

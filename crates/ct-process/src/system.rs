//! Ordered pipeline of process units.

use std::fmt;

use crate::error::ProcessResult;
use crate::state::ProcessState;
use crate::unit::ProcessUnit;
use ct_core::units::{Power, watt};
use ct_fluids::FluidStream;

/// Units propagated strictly in order: unit *i*'s outlet is unit *i+1*'s inlet.
///
/// A `ProcessSystem` is itself a `ProcessUnit`, so systems nest (a recirculation
/// loop wraps one).
#[derive(Default)]
pub struct ProcessSystem {
    name: String,
    units: Vec<Box<dyn ProcessUnit>>,
}

impl fmt::Debug for ProcessSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.units.iter().map(|u| u.name()).collect();
        f.debug_struct("ProcessSystem")
            .field("name", &self.name)
            .field("units", &names)
            .finish()
    }
}

impl ProcessSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl ProcessUnit + 'static) -> Self {
        self.push(unit);
        self
    }

    pub fn push(&mut self, unit: impl ProcessUnit + 'static) {
        self.units.push(Box::new(unit));
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Propagate through every unit, returning the inlet and each unit outlet.
    pub fn propagate_trace(
        &self,
        inlet: &FluidStream,
        state: &ProcessState,
    ) -> ProcessResult<Vec<FluidStream>> {
        let mut streams = Vec::with_capacity(self.units.len() + 1);
        streams.push(inlet.clone());
        for unit in &self.units {
            let next = match streams.last() {
                Some(stream) => unit.propagate(stream, state)?,
                None => unit.propagate(inlet, state)?,
            };
            streams.push(next);
        }
        Ok(streams)
    }
}

impl ProcessUnit for ProcessSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<FluidStream> {
        let mut stream = inlet.clone();
        for unit in &self.units {
            stream = unit.propagate(&stream, state)?;
        }
        Ok(stream)
    }

    fn shaft_power(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<Power> {
        let mut total = watt(0.0);
        let mut stream = inlet.clone();
        for unit in &self.units {
            total += unit.shaft_power(&stream, state)?;
            stream = unit.propagate(&stream, state)?;
        }
        Ok(total)
    }

    /// Capacity of the first unit that has one, evaluated at its own inlet.
    fn maximum_standard_rate(
        &self,
        inlet: &FluidStream,
        state: &ProcessState,
    ) -> ProcessResult<Option<f64>> {
        let mut stream = inlet.clone();
        for unit in &self.units {
            if let Some(limit) = unit.maximum_standard_rate(&stream, state)? {
                return Ok(Some(limit));
            }
            stream = unit.propagate(&stream, state)?;
        }
        Ok(None)
    }
}

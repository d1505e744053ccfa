//! Choke valve: isenthalpic pressure reduction set by the session state.

use crate::error::{ProcessError, ProcessResult};
use crate::state::ProcessState;
use crate::unit::ProcessUnit;
use ct_core::ChokeId;
use ct_core::units::bara;
use ct_fluids::FluidStream;

#[derive(Debug, Clone)]
pub struct Choke {
    name: String,
    id: ChokeId,
}

impl Choke {
    pub fn new(name: impl Into<String>, id: ChokeId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn id(&self) -> ChokeId {
        self.id
    }
}

impl ProcessUnit for Choke {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<FluidStream> {
        let delta_p = state.choke_pressure_drop(self.id)?;
        if delta_p <= 0.0 {
            return Ok(inlet.clone());
        }
        let p_out = inlet.pressure_bara() - delta_p;
        if p_out <= 0.0 {
            return Err(ProcessError::NonPhysical {
                what: "choke pressure drop exceeds inlet pressure",
            });
        }
        Ok(inlet.flash_to_pressure_and_enthalpy_change(bara(p_out), 0.0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_core::units::k;
    use ct_fluids::{Composition, VirialGasModel};
    use std::sync::Arc;

    fn inlet() -> FluidStream {
        FluidStream::create_stream_from_standard_rate(
            Arc::new(VirialGasModel::new()),
            Composition::dry_gas(),
            bara(50.0),
            k(310.0),
            1.0e6,
        )
        .unwrap()
    }

    #[test]
    fn open_choke_is_pass_through() {
        let choke = Choke::new("upstream", ChokeId::from_index(0));
        let state = ProcessState::new(0, 1);
        let stream = inlet();
        let out = choke.propagate(&stream, &state).unwrap();
        assert_eq!(out.pressure(), stream.pressure());
        assert_eq!(out.temperature(), stream.temperature());
    }

    #[test]
    fn throttles_isenthalpically() {
        let choke = Choke::new("downstream", ChokeId::from_index(0));
        let mut state = ProcessState::new(0, 1);
        state.set_choke_pressure_drop(choke.id(), 10.0).unwrap();
        let stream = inlet();
        let out = choke.propagate(&stream, &state).unwrap();
        assert!((out.pressure_bara() - 40.0).abs() < 1e-9);
        assert!((out.enthalpy() - stream.enthalpy()).abs() < 1e-3);
        assert!(out.temperature().value < stream.temperature().value);
    }

    #[test]
    fn excessive_drop_is_non_physical() {
        let choke = Choke::new("c", ChokeId::from_index(0));
        let mut state = ProcessState::new(0, 1);
        state.set_choke_pressure_drop(choke.id(), 60.0).unwrap();
        let result = choke.propagate(&inlet(), &state);
        assert!(matches!(result, Err(ProcessError::NonPhysical { .. })));
    }
}

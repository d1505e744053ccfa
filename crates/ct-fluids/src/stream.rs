//! Immutable gas stream flowing between process units.
//!
//! A `FluidStream` is a thermodynamic state, the property pack evaluated at that
//! state, and a mass rate. Every transformation returns a new stream; the
//! property backend is shared through an `Arc`.

use std::fmt;
use std::sync::Arc;

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{FluidModel, ThermoPropertyPack};
use crate::state::{StateInput, ThermoState};
use ct_core::units::constants::{SECONDS_PER_DAY, SECONDS_PER_HOUR, standard_density};
use ct_core::units::{MassRate, Pressure, Temperature, kgps, to_bara};

#[derive(Clone)]
pub struct FluidStream {
    model: Arc<dyn FluidModel>,
    state: ThermoState,
    props: ThermoPropertyPack,
    mass_rate_kgps: f64,
}

impl fmt::Debug for FluidStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluidStream")
            .field("model", &self.model.name())
            .field("p_bara", &self.pressure_bara())
            .field("t_k", &self.temperature().value)
            .field("standard_rate", &self.standard_rate())
            .finish()
    }
}

fn validate_rate(v: f64) -> FluidResult<f64> {
    if !v.is_finite() || v < 0.0 {
        return Err(FluidError::InvalidArg {
            what: "flow rate must be finite and non-negative",
        });
    }
    Ok(v)
}

impl FluidStream {
    /// Stream at (P, T) carrying `mass_rate`.
    pub fn from_mass_rate(
        model: Arc<dyn FluidModel>,
        comp: Composition,
        p: Pressure,
        t: Temperature,
        mass_rate: MassRate,
    ) -> FluidResult<Self> {
        let mass_rate_kgps = validate_rate(mass_rate.value)?;
        let state = model.state(StateInput::PT { p, t }, comp)?;
        Self::from_state(model, state, mass_rate_kgps)
    }

    /// Stream at (P, T) carrying a standard volumetric rate [Sm³/day].
    pub fn create_stream_from_standard_rate(
        model: Arc<dyn FluidModel>,
        comp: Composition,
        p: Pressure,
        t: Temperature,
        standard_rate_sm3_per_day: f64,
    ) -> FluidResult<Self> {
        let rate = validate_rate(standard_rate_sm3_per_day)?;
        let mass_rate = rate * standard_density(comp.molar_mass()) / SECONDS_PER_DAY;
        Self::from_mass_rate(model, comp, p, t, kgps(mass_rate))
    }

    fn from_state(
        model: Arc<dyn FluidModel>,
        state: ThermoState,
        mass_rate_kgps: f64,
    ) -> FluidResult<Self> {
        let props = model.property_pack(&state)?;
        Ok(Self {
            model,
            state,
            props,
            mass_rate_kgps,
        })
    }

    /// New stream at pressure `p` and specific enthalpy `h + dh`, same rate.
    ///
    /// `dh = 0` is an isenthalpic throttle.
    pub fn flash_to_pressure_and_enthalpy_change(
        &self,
        p: Pressure,
        enthalpy_change: f64,
    ) -> FluidResult<Self> {
        if !enthalpy_change.is_finite() {
            return Err(FluidError::InvalidArg {
                what: "enthalpy change must be finite",
            });
        }
        let h = self.props.h + enthalpy_change;
        let state = self
            .model
            .state(StateInput::PH { p, h }, self.state.composition().clone())?;
        Self::from_state(Arc::clone(&self.model), state, self.mass_rate_kgps)
    }

    /// Same thermodynamic state, new standard volumetric rate [Sm³/day].
    pub fn with_standard_rate(&self, standard_rate_sm3_per_day: f64) -> FluidResult<Self> {
        let rate = validate_rate(standard_rate_sm3_per_day)?;
        let mut next = self.clone();
        next.mass_rate_kgps = rate * self.standard_density() / SECONDS_PER_DAY;
        Ok(next)
    }

    /// Same pressure and rate, new temperature.
    pub fn with_temperature(&self, t: Temperature) -> FluidResult<Self> {
        let state = self.model.state(
            StateInput::PT {
                p: self.pressure(),
                t,
            },
            self.state.composition().clone(),
        )?;
        Self::from_state(Arc::clone(&self.model), state, self.mass_rate_kgps)
    }

    /// Same temperature and rate, new pressure.
    pub fn with_pressure(&self, p: Pressure) -> FluidResult<Self> {
        let state = self.model.state(
            StateInput::PT {
                p,
                t: self.temperature(),
            },
            self.state.composition().clone(),
        )?;
        Self::from_state(Arc::clone(&self.model), state, self.mass_rate_kgps)
    }

    pub fn model(&self) -> &Arc<dyn FluidModel> {
        &self.model
    }

    pub fn state(&self) -> &ThermoState {
        &self.state
    }

    pub fn props(&self) -> &ThermoPropertyPack {
        &self.props
    }

    pub fn composition(&self) -> &Composition {
        self.state.composition()
    }

    pub fn pressure(&self) -> Pressure {
        self.state.pressure()
    }

    pub fn pressure_bara(&self) -> f64 {
        to_bara(self.state.pressure())
    }

    pub fn temperature(&self) -> Temperature {
        self.state.temperature()
    }

    pub fn mass_rate(&self) -> MassRate {
        kgps(self.mass_rate_kgps)
    }

    pub fn mass_rate_kgps(&self) -> f64 {
        self.mass_rate_kgps
    }

    /// Density [kg/m³]
    pub fn density(&self) -> f64 {
        self.props.rho.value
    }

    /// Specific enthalpy [J/kg]
    pub fn enthalpy(&self) -> f64 {
        self.props.h
    }

    pub fn z(&self) -> f64 {
        self.props.z
    }

    pub fn kappa(&self) -> f64 {
        self.props.kappa
    }

    pub fn vapor_fraction(&self) -> f64 {
        self.props.vapor_fraction
    }

    /// Molar mass [kg/kmol]
    pub fn molar_mass(&self) -> f64 {
        self.props.molar_mass
    }

    /// Density at standard conditions [kg/Sm³]
    pub fn standard_density(&self) -> f64 {
        standard_density(self.props.molar_mass)
    }

    /// Standard volumetric rate [Sm³/day]
    pub fn standard_rate(&self) -> f64 {
        self.mass_rate_kgps * SECONDS_PER_DAY / self.standard_density()
    }

    /// Actual volumetric rate at the stream's own conditions [Am³/h]
    pub fn actual_rate(&self) -> f64 {
        self.mass_rate_kgps * SECONDS_PER_HOUR / self.density()
    }
}

//! Fluid property model trait and validation helpers.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::state::{SpecEnthalpy, StateInput, ThermoState};
use ct_core::units::{Density, Pressure, Temperature};

/// Cached thermodynamic properties from a single state.
///
/// Every `FluidStream` carries one of these, so property accessors on a stream
/// never go back to the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct ThermoPropertyPack {
    /// Pressure [Pa]
    pub p: Pressure,

    /// Temperature [K]
    pub t: Temperature,

    /// Density [kg/m³]
    pub rho: Density,

    /// Specific enthalpy [J/kg]
    pub h: SpecEnthalpy,

    /// Compressibility factor Z = P·M/(ρ·R·T) (dimensionless)
    pub z: f64,

    /// Heat capacity ratio κ = cp/cv (dimensionless)
    pub kappa: f64,

    /// Molar mass [kg/kmol]
    pub molar_mass: f64,

    /// Molar vapor fraction (1.0 for single-phase gas)
    pub vapor_fraction: f64,
}

impl ThermoPropertyPack {
    /// Return a summary string of all contained properties (for debugging).
    pub fn summary(&self) -> String {
        format!(
            "Pack(P={:.0}Pa,T={:.2}K,ρ={:.3}kg/m³,h={:.1}J/kg,Z={:.4},κ={:.4},M={:.3},β={:.3})",
            self.p.value,
            self.t.value,
            self.rho.value,
            self.h,
            self.z,
            self.kappa,
            self.molar_mass,
            self.vapor_fraction
        )
    }
}

/// Thermodynamic Property Service consumed by the process pipeline.
///
/// Implementations must be thread-safe (Send + Sync) so independent time steps
/// can be evaluated in parallel. The solver treats a model as a pure function
/// of (composition, P, T); no caching or hidden state is assumed.
pub trait FluidModel: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Check if this model supports the given composition.
    fn supports_composition(&self, comp: &Composition) -> bool;

    /// Create a thermodynamic state from input specification.
    ///
    /// For PT input: validates and creates state directly.
    /// For PH input: solves for temperature, then creates state.
    fn state(&self, input: StateInput, comp: Composition) -> FluidResult<ThermoState>;

    /// Density [kg/m³] at the given state.
    fn rho(&self, state: &ThermoState) -> FluidResult<Density>;

    /// Specific enthalpy [J/kg] at the given state.
    fn h(&self, state: &ThermoState) -> FluidResult<SpecEnthalpy>;

    /// Compressibility factor at the given state.
    fn z(&self, state: &ThermoState) -> FluidResult<f64>;

    /// Heat capacity ratio cp/cv at the given state.
    fn kappa(&self, state: &ThermoState) -> FluidResult<f64>;

    /// Molar vapor fraction at the given state.
    fn vapor_fraction(&self, _state: &ThermoState) -> FluidResult<f64> {
        Ok(1.0)
    }

    /// Compute the complete property pack in one call.
    ///
    /// Default implementation calls individual property methods; backends that
    /// share work between properties override it.
    fn property_pack(&self, state: &ThermoState) -> FluidResult<ThermoPropertyPack> {
        let pack = ThermoPropertyPack {
            p: state.pressure(),
            t: state.temperature(),
            rho: self.rho(state)?,
            h: self.h(state)?,
            z: self.z(state)?,
            kappa: self.kappa(state)?,
            molar_mass: state.composition().molar_mass(),
            vapor_fraction: self.vapor_fraction(state)?,
        };
        validation::validate_pack(&pack)?;
        Ok(pack)
    }
}

/// Validation helpers for fluid properties.
pub(crate) mod validation {
    use super::*;

    /// Ensure pressure is positive and finite.
    pub fn validate_pressure(p: Pressure) -> FluidResult<()> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure temperature is positive and finite.
    pub fn validate_temperature(t: Temperature) -> FluidResult<()> {
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure enthalpy is finite (can be negative).
    pub fn validate_enthalpy(h: f64) -> FluidResult<()> {
        if !h.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "enthalpy must be finite",
            });
        }
        Ok(())
    }

    /// Ensure a property pack is physically plausible.
    pub fn validate_pack(pack: &ThermoPropertyPack) -> FluidResult<()> {
        validate_pressure(pack.p)?;
        validate_temperature(pack.t)?;
        validate_enthalpy(pack.h)?;
        if !pack.rho.value.is_finite() || pack.rho.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        if !pack.z.is_finite() || pack.z <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "compressibility must be positive and finite",
            });
        }
        if !pack.kappa.is_finite() || pack.kappa <= 1.0 {
            return Err(FluidError::NonPhysical {
                what: "kappa must be > 1 and finite",
            });
        }
        if !(0.0..=1.0).contains(&pack.vapor_fraction) {
            return Err(FluidError::NonPhysical {
                what: "vapor fraction must be within [0, 1]",
            });
        }
        Ok(())
    }
}

//! CoolProp-based fluid property model.
//!
//! Only compiled with the `coolprop` feature. Pure fluids only.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{FluidModel, ThermoPropertyPack, validation};
use crate::state::{SpecEnthalpy, StateInput, ThermoState};
use ct_core::units::constants::R_UNIVERSAL;
use ct_core::units::{Density, k, kg_per_m3};
use rfluids::prelude::*;

/// CoolProp backend for fluid properties.
///
/// Thread-safe: rfluids Fluid instances are created per query.
#[derive(Debug, Default)]
pub struct CoolPropModel {}

/// Raw backend values at one (P, T) point.
struct PointProps {
    rho: f64,
    h: f64,
    cp: f64,
}

fn backend_err(what: &str, e: impl std::fmt::Display) -> FluidError {
    FluidError::Backend {
        message: format!("rfluids error getting {what}: {e}"),
    }
}

impl CoolPropModel {
    pub fn new() -> Self {
        Self {}
    }

    fn pure_of(comp: &Composition) -> FluidResult<Pure> {
        comp.is_pure()
            .map(|species| species.rfluids_pure())
            .ok_or(FluidError::NotSupported {
                what: "composition not supported (mixtures or unsupported species)",
            })
    }

    fn fluid_at_pt(&self, pure: Pure, p_pa: f64, t_k: f64) -> FluidResult<Fluid> {
        Fluid::from(pure)
            .in_state(FluidInput::pressure(p_pa), FluidInput::temperature(t_k))
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error at P={} Pa, T={} K: {}", p_pa, t_k, e),
            })
    }

    fn point(&self, pure: Pure, p_pa: f64, t_k: f64) -> FluidResult<PointProps> {
        let mut fluid = self.fluid_at_pt(pure, p_pa, t_k)?;
        Ok(PointProps {
            rho: fluid.density().map_err(|e| backend_err("density", e))?,
            h: fluid.enthalpy().map_err(|e| backend_err("enthalpy", e))?,
            cp: fluid.specific_heat().map_err(|e| backend_err("cp", e))?,
        })
    }

    fn enthalpy_at(&self, pure: Pure, p_pa: f64, t_k: f64) -> FluidResult<f64> {
        let mut fluid = self.fluid_at_pt(pure, p_pa, t_k)?;
        fluid.enthalpy().map_err(|e| backend_err("enthalpy", e))
    }

    /// Solve for temperature given pressure and enthalpy by bisection.
    fn solve_t_from_ph(&self, pure: Pure, p_pa: f64, h_target: f64) -> FluidResult<f64> {
        const T_MIN: f64 = 100.0;
        const T_MAX: f64 = 2000.0;
        const MAX_ITER: usize = 100;

        let mut t_low = T_MIN;
        let mut t_high = T_MAX;
        let h_low = self.enthalpy_at(pure, p_pa, t_low)?;
        let h_high = self.enthalpy_at(pure, p_pa, t_high)?;

        if h_target < h_low || h_target > h_high {
            return Err(FluidError::OutOfRange {
                what: "enthalpy outside valid range for given pressure",
            });
        }

        for _ in 0..MAX_ITER {
            let t_mid = 0.5 * (t_low + t_high);
            let h_mid = self.enthalpy_at(pure, p_pa, t_mid)?;

            let tol = 1.0_f64.max(h_target.abs() * 1e-6);
            if (h_mid - h_target).abs() < tol {
                return Ok(t_mid);
            }
            if h_mid < h_target {
                t_low = t_mid;
            } else {
                t_high = t_mid;
            }
        }

        Ok(0.5 * (t_low + t_high))
    }
}

impl FluidModel for CoolPropModel {
    fn name(&self) -> &str {
        "CoolProp"
    }

    fn supports_composition(&self, comp: &Composition) -> bool {
        Self::pure_of(comp).is_ok()
    }

    fn state(&self, input: StateInput, comp: Composition) -> FluidResult<ThermoState> {
        let pure = Self::pure_of(&comp)?;
        match input {
            StateInput::PT { p, t } => {
                validation::validate_pressure(p)?;
                validation::validate_temperature(t)?;
                let _fluid = self.fluid_at_pt(pure, p.value, t.value)?;
                ThermoState::from_pt(p, t, comp)
            }
            StateInput::PH { p, h } => {
                validation::validate_pressure(p)?;
                validation::validate_enthalpy(h)?;
                let t_k = self.solve_t_from_ph(pure, p.value, h)?;
                ThermoState::from_pt(p, k(t_k), comp)
            }
        }
    }

    fn rho(&self, state: &ThermoState) -> FluidResult<Density> {
        Ok(self.property_pack(state)?.rho)
    }

    fn h(&self, state: &ThermoState) -> FluidResult<SpecEnthalpy> {
        let pure = Self::pure_of(state.composition())?;
        self.enthalpy_at(pure, state.pressure().value, state.temperature().value)
    }

    fn z(&self, state: &ThermoState) -> FluidResult<f64> {
        Ok(self.property_pack(state)?.z)
    }

    fn kappa(&self, state: &ThermoState) -> FluidResult<f64> {
        Ok(self.property_pack(state)?.kappa)
    }

    fn property_pack(&self, state: &ThermoState) -> FluidResult<ThermoPropertyPack> {
        let pure = Self::pure_of(state.composition())?;
        let p_pa = state.pressure().value;
        let t_k = state.temperature().value;
        let raw = self.point(pure, p_pa, t_k)?;

        let molar_mass = state.composition().molar_mass();
        // cv = cp - R_specific uses the real-gas R_specific = p / (rho * T)
        let r_specific = p_pa / (raw.rho * t_k);
        let cv = raw.cp - r_specific;
        if cv <= 0.0 || !cv.is_finite() {
            return Err(FluidError::Backend {
                message: "Failed to compute cv for kappa calculation".into(),
            });
        }

        let pack = ThermoPropertyPack {
            p: state.pressure(),
            t: state.temperature(),
            rho: kg_per_m3(raw.rho),
            h: raw.h,
            z: p_pa * molar_mass / (raw.rho * R_UNIVERSAL * t_k),
            kappa: raw.cp / cv,
            molar_mass,
            vapor_fraction: 1.0,
        };
        validation::validate_pack(&pack)?;
        Ok(pack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;

    #[test]
    fn model_name() {
        assert_eq!(CoolPropModel::new().name(), "CoolProp");
    }

    #[test]
    fn supports_pure_fluids() {
        let model = CoolPropModel::new();
        assert!(model.supports_composition(&Composition::pure(Species::CH4)));
        assert!(model.supports_composition(&Composition::pure(Species::N2)));
    }

    #[test]
    fn does_not_support_mixtures() {
        let model = CoolPropModel::new();
        assert!(!model.supports_composition(&Composition::dry_gas()));
    }
}

//! Truncated-virial gas model used as the reference property backend.
//!
//! Mixtures are reduced to a pseudo-pure fluid with Kay's rule. The second
//! virial coefficient follows the Pitzer–Abbott generalized correlation and is
//! applied in exponential form
//!
//! ```text
//! Z = exp(B·P / (R·T))
//! ```
//!
//! which agrees with `Z = 1 + B·P/(R·T)` at low pressure but stays positive at
//! any pressure, so trial states far outside the envelope never produce a
//! negative density. The residual enthalpy is the one consistent with this Z:
//!
//! ```text
//! H_R = R·Tc·Pr·(B̂ - Tr·dB̂/dTr)·(exp(x) - 1)/x,   x = B̂·Pr/Tr
//! ```
//!
//! Ideal-gas heat capacity is linear in temperature per species and kappa is
//! taken from the ideal-gas cp/cv.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{FluidModel, ThermoPropertyPack, validation};
use crate::state::{SpecEnthalpy, StateInput, ThermoState};
use ct_core::units::constants::R_UNIVERSAL;
use ct_core::units::{Density, k, kg_per_m3};

/// Reference temperature for ideal-gas enthalpy [K]
const T_REF: f64 = 298.15;

/// Pseudo-pure mixture parameters (molar basis).
#[derive(Debug, Clone, Copy)]
struct Mixture {
    molar_mass: f64,
    tc: f64,
    pc: f64,
    omega: f64,
    cp_a: f64,
    cp_b: f64,
}

impl Mixture {
    fn from_composition(comp: &Composition) -> Self {
        Self {
            molar_mass: comp.molar_mass(),
            tc: comp.mole_average(|s| s.data().critical_temperature),
            pc: comp.mole_average(|s| s.data().critical_pressure),
            omega: comp.mole_average(|s| s.data().acentric_factor),
            cp_a: comp.mole_average(|s| s.data().cp_a),
            cp_b: comp.mole_average(|s| s.data().cp_b),
        }
    }

    /// Ideal-gas heat capacity [J/(kmol·K)]
    fn cp_ideal(&self, t: f64) -> f64 {
        1000.0 * (self.cp_a + self.cp_b * t)
    }

    /// Ideal-gas enthalpy relative to `T_REF` [J/kmol]
    fn h_ideal(&self, t: f64) -> f64 {
        1000.0 * (self.cp_a * (t - T_REF) + 0.5 * self.cp_b * (t * t - T_REF * T_REF))
    }

    /// Reduced second virial coefficient B̂ = B·Pc/(R·Tc) and dB̂/dTr.
    fn reduced_virial(&self, tr: f64) -> (f64, f64) {
        let b0 = 0.083 - 0.422 / tr.powf(1.6);
        let b1 = 0.139 - 0.172 / tr.powf(4.2);
        let db0 = 0.675 / tr.powf(2.6);
        let db1 = 0.722 / tr.powf(5.2);
        (b0 + self.omega * b1, db0 + self.omega * db1)
    }

    fn exponent(&self, p: f64, t: f64) -> (f64, f64, f64, f64) {
        let tr = t / self.tc;
        let pr = p / self.pc;
        let (b_hat, db_hat) = self.reduced_virial(tr);
        (b_hat * pr / tr, tr, pr, b_hat - tr * db_hat)
    }

    fn z(&self, p: f64, t: f64) -> f64 {
        let (x, ..) = self.exponent(p, t);
        x.exp()
    }

    /// Specific enthalpy [J/kg]
    fn enthalpy(&self, p: f64, t: f64) -> f64 {
        let (x, _tr, pr, departure) = self.exponent(p, t);
        let phi = if x.abs() < 1e-8 {
            1.0 + 0.5 * x
        } else {
            x.exp_m1() / x
        };
        let h_residual = R_UNIVERSAL * self.tc * pr * departure * phi;
        (self.h_ideal(t) + h_residual) / self.molar_mass
    }

    fn density(&self, p: f64, t: f64) -> f64 {
        p * self.molar_mass / (self.z(p, t) * R_UNIVERSAL * t)
    }

    fn kappa(&self, t: f64) -> f64 {
        let cp = self.cp_ideal(t);
        cp / (cp - R_UNIVERSAL)
    }
}

/// Virial-gas backend for natural gas mixtures.
#[derive(Debug, Clone)]
pub struct VirialGasModel {
    /// Lower temperature limit for PH flashes [K]
    pub t_min: f64,
    /// Upper temperature limit for PH flashes [K]
    pub t_max: f64,
}

impl Default for VirialGasModel {
    fn default() -> Self {
        Self {
            t_min: 120.0,
            t_max: 1200.0,
        }
    }
}

impl VirialGasModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve for temperature given pressure and enthalpy.
    ///
    /// Newton on h(T) with a bisection safeguard inside `[t_min, t_max]`.
    fn solve_t_from_ph(&self, mix: &Mixture, p_pa: f64, h_target: f64) -> FluidResult<f64> {
        const MAX_ITER: usize = 60;
        const H_TOL: f64 = 1e-6;
        const T_TOL: f64 = 1e-10;
        const DT: f64 = 1e-3;

        let mut t_low = self.t_min;
        let mut t_high = self.t_max;
        let r_low = mix.enthalpy(p_pa, t_low) - h_target;
        let r_high = mix.enthalpy(p_pa, t_high) - h_target;

        if !r_low.is_finite() || !r_high.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "enthalpy not finite at flash temperature limits",
            });
        }
        if r_low > 0.0 || r_high < 0.0 {
            return Err(FluidError::OutOfRange {
                what: "enthalpy outside valid range for given pressure",
            });
        }

        let mut t = t_low + (t_high - t_low) * (-r_low) / (r_high - r_low);
        for _ in 0..MAX_ITER {
            let residual = mix.enthalpy(p_pa, t) - h_target;
            if residual.abs() < H_TOL {
                return Ok(t);
            }
            if residual < 0.0 {
                t_low = t;
            } else {
                t_high = t;
            }

            let slope =
                (mix.enthalpy(p_pa, t + DT) - mix.enthalpy(p_pa, t - DT)) / (2.0 * DT);
            let mut t_next = t - residual / slope;
            if !t_next.is_finite() || t_next <= t_low || t_next >= t_high {
                t_next = 0.5 * (t_low + t_high);
            }
            if (t_next - t).abs() < T_TOL {
                return Ok(t_next);
            }
            t = t_next;
        }

        tracing::debug!(p_pa, h_target, t, "PH flash hit iteration limit");
        Ok(t)
    }

    fn mixture(&self, comp: &Composition) -> FluidResult<Mixture> {
        if !self.supports_composition(comp) {
            return Err(FluidError::NotSupported {
                what: "empty composition",
            });
        }
        Ok(Mixture::from_composition(comp))
    }
}

impl FluidModel for VirialGasModel {
    fn name(&self) -> &str {
        "Virial gas (Pitzer-Abbott)"
    }

    fn supports_composition(&self, comp: &Composition) -> bool {
        comp.iter().next().is_some()
    }

    fn state(&self, input: StateInput, comp: Composition) -> FluidResult<ThermoState> {
        let mix = self.mixture(&comp)?;
        match input {
            StateInput::PT { p, t } => {
                validation::validate_pressure(p)?;
                validation::validate_temperature(t)?;
                ThermoState::from_pt(p, t, comp)
            }
            StateInput::PH { p, h } => {
                validation::validate_pressure(p)?;
                validation::validate_enthalpy(h)?;
                let t_k = self.solve_t_from_ph(&mix, p.value, h)?;
                ThermoState::from_pt(p, k(t_k), comp)
            }
        }
    }

    fn rho(&self, state: &ThermoState) -> FluidResult<Density> {
        let mix = self.mixture(state.composition())?;
        Ok(kg_per_m3(mix.density(
            state.pressure().value,
            state.temperature().value,
        )))
    }

    fn h(&self, state: &ThermoState) -> FluidResult<SpecEnthalpy> {
        let mix = self.mixture(state.composition())?;
        Ok(mix.enthalpy(state.pressure().value, state.temperature().value))
    }

    fn z(&self, state: &ThermoState) -> FluidResult<f64> {
        let mix = self.mixture(state.composition())?;
        Ok(mix.z(state.pressure().value, state.temperature().value))
    }

    fn kappa(&self, state: &ThermoState) -> FluidResult<f64> {
        let mix = self.mixture(state.composition())?;
        Ok(mix.kappa(state.temperature().value))
    }

    fn property_pack(&self, state: &ThermoState) -> FluidResult<ThermoPropertyPack> {
        let mix = self.mixture(state.composition())?;
        let p = state.pressure().value;
        let t = state.temperature().value;
        let pack = ThermoPropertyPack {
            p: state.pressure(),
            t: state.temperature(),
            rho: kg_per_m3(mix.density(p, t)),
            h: mix.enthalpy(p, t),
            z: mix.z(p, t),
            kappa: mix.kappa(t),
            molar_mass: mix.molar_mass,
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
    use ct_core::units::bara;

    fn methane_at(p_bara: f64, t_k: f64) -> (VirialGasModel, ThermoState) {
        let model = VirialGasModel::new();
        let state = model
            .state(
                StateInput::PT {
                    p: bara(p_bara),
                    t: k(t_k),
                },
                Composition::pure(Species::CH4),
            )
            .unwrap();
        (model, state)
    }

    #[test]
    fn methane_compressibility_at_pipeline_conditions() {
        let (model, state) = methane_at(30.0, 300.0);
        let z = model.z(&state).unwrap();
        // reference value for methane at 30 bar / 300 K is about 0.95
        assert!(z > 0.93 && z < 0.97, "Z = {z}");
    }

    #[test]
    fn approaches_ideal_gas_at_low_pressure() {
        let (model, state) = methane_at(0.01, 300.0);
        let z = model.z(&state).unwrap();
        assert!((z - 1.0).abs() < 1e-3);
        let rho = model.rho(&state).unwrap().value;
        let rho_ideal = 1000.0 * 16.043 / (R_UNIVERSAL * 300.0);
        assert!((rho - rho_ideal).abs() / rho_ideal < 1e-3);
    }

    #[test]
    fn density_increases_with_pressure() {
        let (model, low) = methane_at(10.0, 300.0);
        let (_, high) = methane_at(100.0, 300.0);
        assert!(model.rho(&high).unwrap().value > model.rho(&low).unwrap().value);
    }

    #[test]
    fn compressibility_stays_positive_at_extreme_pressure() {
        let (model, state) = methane_at(1000.0, 250.0);
        let z = model.z(&state).unwrap();
        assert!(z > 0.0 && z.is_finite());
    }

    #[test]
    fn ph_flash_recovers_temperature() {
        let (model, state) = methane_at(50.0, 340.0);
        let h = model.h(&state).unwrap();
        let flashed = model
            .state(
                StateInput::PH { p: bara(50.0), h },
                Composition::pure(Species::CH4),
            )
            .unwrap();
        assert!((flashed.temperature().value - 340.0).abs() < 1e-5);
    }

    #[test]
    fn ph_flash_rejects_unreachable_enthalpy() {
        let model = VirialGasModel::new();
        let result = model.state(
            StateInput::PH {
                p: bara(50.0),
                h: 1.0e9,
            },
            Composition::dry_gas(),
        );
        assert!(matches!(result, Err(FluidError::OutOfRange { .. })));
    }

    #[test]
    fn kappa_is_plausible_for_natural_gas() {
        let model = VirialGasModel::new();
        let state = model
            .state(
                StateInput::PT {
                    p: bara(30.0),
                    t: k(300.0),
                },
                Composition::dry_gas(),
            )
            .unwrap();
        let pack = model.property_pack(&state).unwrap();
        assert!(pack.kappa > 1.2 && pack.kappa < 1.35, "kappa = {}", pack.kappa);
        assert_eq!(pack.vapor_fraction, 1.0);
    }

    #[test]
    fn enthalpy_increases_with_temperature() {
        let (model, cold) = methane_at(30.0, 300.0);
        let (_, hot) = methane_at(30.0, 350.0);
        assert!(model.h(&hot).unwrap() > model.h(&cold).unwrap());
    }
}

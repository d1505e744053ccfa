//! Stage outlet pressure by damped fixed-point iteration.
//!
//! Given a polytropic head `H` and efficiency `η`, the outlet pressure follows
//! from the polytropic relation
//!
//! ```text
//! P2 = P1 · (1 + H · ((n-1)/n) · M / (Z·R·T1))^(n/(n-1)),   (n-1)/n = (κ-1)/(κ·η)
//! ```
//!
//! where Z and κ should be averaged over inlet and outlet. The outlet is not
//! known up front, so the routine starts from inlet values, flashes to
//! `(P2, h1 + H/η)`, re-evaluates with averaged Z and κ, and repeats with
//! adaptive under-relaxation until the pressure settles.

use crate::error::{ProcessError, ProcessResult};
use ct_core::relative_difference;
use ct_core::units::bara;
use ct_core::units::constants::R_UNIVERSAL;
use ct_fluids::FluidStream;

/// Tuning for the outlet pressure iteration.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutletConvergenceConfig {
    /// Relative change in outlet pressure that counts as converged
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Relaxation factor at the first iteration
    pub beta_initial: f64,
    pub beta_min: f64,
    pub beta_max: f64,
    /// Multiplier applied to beta when the iteration oscillates
    pub damping_ratio: f64,
    /// Multiplier applied to beta after a run of stable iterations
    pub recovery_ratio: f64,
    /// Relative step above which an oscillation triggers damping
    pub large_step: f64,
    /// Consecutive same-sign steps before beta is relaxed upward
    pub stable_iterations: usize,
    /// Hard ceiling on outlet pressure estimates [bara]
    pub max_outlet_pressure_bara: f64,
}

impl Default for OutletConvergenceConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 30,
            beta_initial: 1.0,
            beta_min: 0.1,
            beta_max: 1.0,
            damping_ratio: 0.5,
            recovery_ratio: 1.5,
            large_step: 0.1,
            stable_iterations: 3,
            max_outlet_pressure_bara: 1000.0,
        }
    }
}

/// Outcome of the outlet iteration. `converged = false` still carries the last
/// computed outlet stream.
#[derive(Debug, Clone)]
pub struct OutletConvergence {
    pub outlet: FluidStream,
    pub iterations: usize,
    pub converged: bool,
}

/// Adaptive under-relaxation driven by the sign history of pressure steps.
#[derive(Debug, Clone)]
pub struct AdaptiveRelaxation {
    beta: f64,
    sign_flips: usize,
    stable: usize,
    last_delta: Option<f64>,
    config: OutletConvergenceConfig,
}

impl AdaptiveRelaxation {
    pub fn new(config: OutletConvergenceConfig) -> Self {
        Self {
            beta: config.beta_initial.clamp(config.beta_min, config.beta_max),
            sign_flips: 0,
            stable: 0,
            last_delta: None,
            config,
        }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Update beta from the raw step `delta` (relative size `relative_step`)
    /// and return the relaxed step to apply.
    pub fn relax(&mut self, delta: f64, relative_step: f64) -> f64 {
        if let Some(previous) = self.last_delta {
            if delta != 0.0 && previous != 0.0 && delta.signum() != previous.signum() {
                self.sign_flips += 1;
                self.stable = 0;
            } else {
                self.stable += 1;
            }
        }
        self.last_delta = Some(delta);

        if self.sign_flips >= 2 && relative_step > self.config.large_step {
            self.beta = (self.beta * self.config.damping_ratio).max(self.config.beta_min);
            self.sign_flips = 0;
        } else if self.stable >= self.config.stable_iterations {
            self.beta = (self.beta * self.config.recovery_ratio).min(self.config.beta_max);
            self.stable = 0;
        }

        self.beta * delta
    }
}

/// Polytropic outlet pressure [bara] for given averaged Z and κ.
fn polytropic_outlet_pressure(
    p1_bara: f64,
    t1_k: f64,
    molar_mass: f64,
    head: f64,
    efficiency: f64,
    z: f64,
    kappa: f64,
) -> ProcessResult<f64> {
    let exponent = (kappa - 1.0) / (kappa * efficiency);
    if !exponent.is_finite() || exponent <= 0.0 {
        return Err(ProcessError::NonPhysical {
            what: "polytropic exponent must be positive",
        });
    }
    let base = 1.0 + head * exponent * molar_mass / (z * R_UNIVERSAL * t1_k);
    let p2 = p1_bara * base.powf(1.0 / exponent);
    if !p2.is_finite() || p2 <= 0.0 {
        return Err(ProcessError::NonPhysical {
            what: "outlet pressure estimate not finite",
        });
    }
    Ok(p2)
}

/// Iterate the stage outlet for a polytropic head [J/kg] and efficiency.
///
/// Never fails on non-convergence: logs a warning and returns the last stream
/// with `converged = false`. Errors are reserved for invalid arguments and
/// property flashes that fail outright.
pub fn converge_outlet(
    inlet: &FluidStream,
    polytropic_head: f64,
    polytropic_efficiency: f64,
    config: &OutletConvergenceConfig,
) -> ProcessResult<OutletConvergence> {
    if !polytropic_head.is_finite() || polytropic_head < 0.0 {
        return Err(ProcessError::InvalidArg {
            what: "polytropic head must be finite and non-negative",
        });
    }
    if !(polytropic_efficiency > 0.0 && polytropic_efficiency <= 1.0) {
        return Err(ProcessError::InvalidArg {
            what: "polytropic efficiency must be in (0, 1]",
        });
    }

    let p1 = inlet.pressure_bara();
    let t1 = inlet.temperature().value;
    let molar_mass = inlet.molar_mass();
    let (z1, kappa1) = (inlet.z(), inlet.kappa());
    let enthalpy_change = polytropic_head / polytropic_efficiency;
    let ceiling = config.max_outlet_pressure_bara;

    let estimate = |z: f64, kappa: f64| -> ProcessResult<f64> {
        let p2 = polytropic_outlet_pressure(
            p1,
            t1,
            molar_mass,
            polytropic_head,
            polytropic_efficiency,
            z,
            kappa,
        )?;
        Ok(p2.min(ceiling))
    };

    let mut p2 = estimate(z1, kappa1)?;
    let mut outlet = inlet.flash_to_pressure_and_enthalpy_change(bara(p2), enthalpy_change)?;
    let mut relaxation = AdaptiveRelaxation::new(*config);

    for iteration in 1..=config.max_iterations {
        let z_avg = 0.5 * (z1 + outlet.z());
        let kappa_avg = 0.5 * (kappa1 + outlet.kappa());
        let p_new = estimate(z_avg, kappa_avg)?;

        let delta = p_new - p2;
        let relative_step = relative_difference(p_new, p2);
        p2 = (p2 + relaxation.relax(delta, relative_step)).min(ceiling);
        outlet = inlet.flash_to_pressure_and_enthalpy_change(bara(p2), enthalpy_change)?;

        tracing::trace!(
            iteration,
            p2_bara = p2,
            relative_step,
            beta = relaxation.beta(),
            "stage outlet iteration"
        );

        if relative_step < config.tolerance {
            return Ok(OutletConvergence {
                outlet,
                iterations: iteration,
                converged: true,
            });
        }
    }

    tracing::warn!(
        p1_bara = p1,
        p2_bara = p2,
        head = polytropic_head,
        efficiency = polytropic_efficiency,
        beta = relaxation.beta(),
        max_iterations = config.max_iterations,
        "stage outlet pressure did not converge; using last iterate"
    );
    Ok(OutletConvergence {
        outlet,
        iterations: config.max_iterations,
        converged: false,
    })
}

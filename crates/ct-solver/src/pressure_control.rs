//! Pressure-control policies: bring outlet pressure down to a target once
//! speed alone cannot.

use crate::capacity::CapacityPolicyKind;
use crate::configuration::{ChokeConfiguration, PressureControlConfiguration, Solution};
use crate::evaluator::SystemEvaluator;
use crate::recirculation::{RecirculationSolver, largest_below_stonewall};
use crate::search::SearchStrategies;
use ct_core::{Boundary, FloatConstraint};
use ct_process::{ProcessError, ProcessResult};

/// Lowest suction pressure an upstream choke may throttle to [bara].
pub const MINIMUM_SUCTION_PRESSURE_BARA: f64 = 1.0;

/// Adjusts a capacity-feasible baseline until outlet pressure meets the target.
///
/// The baseline already satisfies minimum flow; policies only ever add
/// recirculation or throttling on top of it.
pub trait PressureControlPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>>;
}

/// The baseline must carry one recirculation rate per loop of the system.
fn check_loop_rates(
    baseline: &PressureControlConfiguration,
    system: &dyn SystemEvaluator,
) -> ProcessResult<()> {
    if baseline.recirculation_rates.len() != system.loop_count() {
        return Err(ProcessError::InvalidArg {
            what: "baseline recirculation rates do not match the loop count",
        });
    }
    Ok(())
}

/// Result of a one-dimensional actuator sweep where more actuation lowers
/// outlet pressure, from `boundary.min()` (the baseline) upwards.
fn sweep_actuator(
    boundary: Boundary,
    target: FloatConstraint,
    strategies: &SearchStrategies,
    evaluate: &mut dyn FnMut(f64) -> ProcessResult<f64>,
    configure: &dyn Fn(f64) -> PressureControlConfiguration,
) -> ProcessResult<Solution<PressureControlConfiguration>> {
    let p_min = evaluate(boundary.min())?;
    if p_min <= target.value || target.is_met(p_min) {
        return Ok(Solution::new(target.is_met(p_min), configure(boundary.min())));
    }

    let max = largest_below_stonewall(strategies, boundary, &mut *evaluate)?;
    let p_max = evaluate(max)?;
    if p_max > target.value {
        tracing::debug!(pressure = p_max, target = target.value, "target below reach");
        return Ok(Solution::new(target.is_met(p_max), configure(max)));
    }

    let outcome = strategies.root_finding.find_root(
        Boundary::new(boundary.min(), max)?,
        target.abs_tol,
        &mut |x| Ok(evaluate(x)? - target.value),
    )?;
    let p = evaluate(outcome.x)?;
    Ok(Solution::new(target.is_met(p), configure(outcome.x)))
}

/// Extra recirculation in the single common loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonAsv;

impl PressureControlPolicy for CommonAsv {
    fn name(&self) -> &'static str {
        "common_asv"
    }

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        if system.loop_count() != 1 {
            return Err(ProcessError::InvalidArg {
                what: "common anti-surge needs exactly one loop",
            });
        }
        let full = system.recirculation_boundary(0, baseline)?;
        let base_rate = baseline.recirculation_rates.first().copied().unwrap_or(0.0);
        let boundary = Boundary::new(base_rate.min(full.max()), full.max())?;
        let solution = RecirculationSolver::new(boundary, Some(target), strategies).solve(
            &mut |c| system.evaluate(&baseline.with_recirculation_rate(0, c.recirculation_rate)),
        )?;
        Ok(solution.map(|c| baseline.with_recirculation_rate(0, c.recirculation_rate)))
    }
}

/// Every loop opens by the same fraction of its remaining headroom.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndividualAsvRate;

impl PressureControlPolicy for IndividualAsvRate {
    fn name(&self) -> &'static str {
        "individual_asv_rate"
    }

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        check_loop_rates(baseline, system)?;
        let mut maxima = Vec::with_capacity(system.loop_count());
        for (index, &base) in baseline.recirculation_rates.iter().enumerate() {
            let full = system.recirculation_boundary(index, baseline)?;
            maxima.push(full.max().max(base));
        }
        let configure = |fraction: f64| {
            let rates = baseline
                .recirculation_rates
                .iter()
                .zip(&maxima)
                .map(|(&base, &max)| base + fraction * (max - base))
                .collect();
            baseline.with_recirculation_rates(rates)
        };
        sweep_actuator(
            Boundary::new(0.0, 1.0)?,
            target,
            strategies,
            &mut |fraction| Ok(system.evaluate(&configure(fraction))?.pressure_bara()),
            &configure,
        )
    }
}

/// Every loop takes an equal share of the overall pressure ratio.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndividualAsvPressure;

impl PressureControlPolicy for IndividualAsvPressure {
    fn name(&self) -> &'static str {
        "individual_asv_pressure"
    }

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        let loops = system.loop_count();
        if loops == 0 {
            return Err(ProcessError::InvalidArg {
                what: "pressure distribution needs at least one loop",
            });
        }
        check_loop_rates(baseline, system)?;
        let p_in = system.inlet().pressure_bara();
        let ratio = (target.value / p_in).powf(1.0 / loops as f64);

        let mut current = baseline.clone();
        for index in 0..loops {
            let loop_target = FloatConstraint::new(
                p_in * ratio.powi(index as i32 + 1),
                target.abs_tol,
            )?;
            let full = system.recirculation_boundary(index, &current)?;
            let base = current.recirculation_rates.get(index).copied().unwrap_or(0.0);
            let boundary = Boundary::new(base.min(full.max()), full.max())?;
            let solution = RecirculationSolver::new(boundary, Some(loop_target), strategies)
                .solve(&mut |c| {
                    let candidate = current.with_recirculation_rate(index, c.recirculation_rate);
                    system.evaluate_through_loop(&candidate, index)
                })?;
            if !solution.success {
                tracing::debug!(
                    loop_index = index,
                    target = loop_target.value,
                    "loop share of pressure ratio not met"
                );
            }
            current = current.with_recirculation_rate(index, solution.configuration.recirculation_rate);
        }

        let p = system.evaluate(&current)?.pressure_bara();
        Ok(Solution::new(target.is_met(p), current))
    }
}

/// Throttles suction ahead of the first stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpstreamChoke;

impl PressureControlPolicy for UpstreamChoke {
    fn name(&self) -> &'static str {
        "upstream_choke"
    }

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        let max_drop = (system.inlet().pressure_bara() - MINIMUM_SUCTION_PRESSURE_BARA).max(0.0);
        let configure = |drop: f64| {
            baseline.with_choke(ChokeConfiguration {
                upstream_pressure_drop: drop,
                ..baseline.choke
            })
        };
        sweep_actuator(
            Boundary::new(baseline.choke.upstream_pressure_drop.min(max_drop), max_drop)?,
            target,
            strategies,
            &mut |drop| Ok(system.evaluate(&configure(drop))?.pressure_bara()),
            &configure,
        )
    }
}

/// Throttles the train outlet straight down to the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct DownstreamChoke;

impl PressureControlPolicy for DownstreamChoke {
    fn name(&self) -> &'static str {
        "downstream_choke"
    }

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
        _strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        let open = baseline.with_choke(ChokeConfiguration {
            downstream_pressure_drop: 0.0,
            ..baseline.choke
        });
        let p = system.evaluate(&open)?.pressure_bara();
        if target.is_met(p) {
            return Ok(Solution::success(open));
        }
        if p < target.value {
            return Ok(Solution::failure(open));
        }
        let throttled = open.with_choke(ChokeConfiguration {
            downstream_pressure_drop: p - target.value,
            ..open.choke
        });
        let p = system.evaluate(&throttled)?.pressure_bara();
        Ok(Solution::new(target.is_met(p), throttled))
    }
}

/// Registry of pressure-control policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PressureControlKind {
    CommonAsv,
    IndividualAsvRate,
    IndividualAsvPressure,
    UpstreamChoke,
    DownstreamChoke,
}

impl PressureControlKind {
    pub fn build(self) -> Box<dyn PressureControlPolicy> {
        match self {
            PressureControlKind::CommonAsv => Box::new(CommonAsv),
            PressureControlKind::IndividualAsvRate => Box::new(IndividualAsvRate),
            PressureControlKind::IndividualAsvPressure => Box::new(IndividualAsvPressure),
            PressureControlKind::UpstreamChoke => Box::new(UpstreamChoke),
            PressureControlKind::DownstreamChoke => Box::new(DownstreamChoke),
        }
    }

    /// Capacity policy paired with this pressure control. Choke trains carry a
    /// loop per stage.
    pub fn capacity_policy(self) -> CapacityPolicyKind {
        match self {
            PressureControlKind::CommonAsv => CapacityPolicyKind::CommonAsvMinFlow,
            _ => CapacityPolicyKind::IndividualAsvMinFlow,
        }
    }

    /// Whether the train has a single loop around all stages.
    pub fn uses_common_loop(self) -> bool {
        self == PressureControlKind::CommonAsv
    }
}

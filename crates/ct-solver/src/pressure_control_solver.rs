//! Two-step solve: speed first, then pressure control at that speed.

use crate::capacity::CapacityPolicy;
use crate::configuration::{PressureControlConfiguration, Solution, SpeedConfiguration};
use crate::evaluator::SystemEvaluator;
use crate::pressure_control::PressureControlPolicy;
use crate::search::SearchStrategies;
use crate::speed::SpeedSolver;
use ct_core::{Boundary, FloatConstraint};
use ct_process::{ProcessError, ProcessResult};

/// Speed found in step A and the configuration found in step B.
///
/// `solution.success` is the overall result: both steps succeeded and the
/// final outlet meets the target. `minimum_flow_restored` only reports the
/// capacity policy at the chosen speed, whatever the pressure step did.
#[derive(Clone, Debug, PartialEq)]
pub struct PressureControlOutcome {
    pub speed: Solution<SpeedConfiguration>,
    pub minimum_flow_restored: bool,
    pub solution: Solution<PressureControlConfiguration>,
}

/// Step A searches speed with the capacity policy applied at every probe.
/// Step B applies the capacity policy at the chosen speed and, if outlet
/// pressure is still above target, the pressure-control policy.
///
/// Process errors in either step end as `success = false`, never as `Err`.
pub struct PressureControlSolver<'a> {
    capacity: &'a dyn CapacityPolicy,
    pressure_control: &'a dyn PressureControlPolicy,
    strategies: &'a SearchStrategies,
    speed_boundary: Boundary,
}

impl<'a> PressureControlSolver<'a> {
    pub fn new(
        capacity: &'a dyn CapacityPolicy,
        pressure_control: &'a dyn PressureControlPolicy,
        strategies: &'a SearchStrategies,
        speed_boundary: Boundary,
    ) -> Self {
        Self {
            capacity,
            pressure_control,
            strategies,
            speed_boundary,
        }
    }

    pub fn solve(
        &self,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
    ) -> ProcessResult<PressureControlOutcome> {
        let speed_result = SpeedSolver::new(self.speed_boundary, target, self.strategies).solve(
            &mut |c| {
                let baseline = self.capacity_baseline(c.speed, system)?;
                system.evaluate(&baseline)
            },
        );
        let speed = match speed_result {
            Ok(speed) => speed,
            Err(e) => {
                tracing::warn!(error = %e, "speed search failed");
                let fallback = self.speed_boundary.max();
                return Ok(PressureControlOutcome {
                    speed: Solution::failure(SpeedConfiguration { speed: fallback }),
                    minimum_flow_restored: false,
                    solution: Solution::failure(PressureControlConfiguration::at_speed(
                        fallback,
                        system.loop_count(),
                    )),
                });
            }
        };
        let chosen = speed.configuration.speed;

        let baseline = self.capacity_baseline(chosen, system);
        let minimum_flow_restored = baseline.is_ok();
        let controlled =
            baseline.and_then(|baseline| self.control_from_baseline(baseline, chosen, target, system));
        let solution = match controlled {
            Ok(solution) => Solution::new(speed.success && solution.success, solution.configuration),
            Err(e) => {
                tracing::warn!(
                    speed = chosen,
                    policy = self.pressure_control.name(),
                    error = %e,
                    "pressure control failed at the chosen speed"
                );
                Solution::failure(PressureControlConfiguration::at_speed(
                    chosen,
                    system.loop_count(),
                ))
            }
        };
        Ok(PressureControlOutcome {
            speed,
            minimum_flow_restored,
            solution,
        })
    }

    /// Configuration at `speed` with minimum flow restored.
    ///
    /// A capacity policy that cannot restore minimum flow is `OutsideCapacity`,
    /// which the speed search reads as "speed too high".
    pub fn capacity_baseline(
        &self,
        speed: f64,
        system: &mut dyn SystemEvaluator,
    ) -> ProcessResult<PressureControlConfiguration> {
        let start = PressureControlConfiguration::at_speed(speed, system.loop_count());
        let solution = self.capacity.apply(&start, system, self.strategies)?;
        if !solution.success {
            tracing::trace!(speed, policy = self.capacity.name(), "minimum flow not restored");
            return Err(ProcessError::OutsideCapacity {
                what: "minimum flow cannot be restored at this speed",
            });
        }
        Ok(solution.configuration)
    }

    fn control_from_baseline(
        &self,
        baseline: PressureControlConfiguration,
        speed: f64,
        target: FloatConstraint,
        system: &mut dyn SystemEvaluator,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        let p = system.evaluate(&baseline)?.pressure_bara();
        if target.is_met(p) {
            return Ok(Solution::success(baseline));
        }
        if p < target.value {
            // pressure control only ever lowers outlet pressure
            return Ok(Solution::failure(baseline));
        }

        let controlled =
            self.pressure_control
                .apply(&baseline, target, system, self.strategies)?;
        let p = system.evaluate(&controlled.configuration)?.pressure_bara();
        tracing::debug!(
            speed,
            policy = self.pressure_control.name(),
            pressure = p,
            target = target.value,
            "pressure control applied"
        );
        Ok(Solution::new(
            controlled.success && target.is_met(p),
            controlled.configuration,
        ))
    }
}

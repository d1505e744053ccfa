//! Capacity policies: restore minimum flow at a given speed.

use crate::configuration::{PressureControlConfiguration, Solution};
use crate::evaluator::SystemEvaluator;
use crate::recirculation::RecirculationSolver;
use crate::search::SearchStrategies;
use ct_process::{ProcessError, ProcessResult};

/// Raises recirculation until no stage is below minimum flow.
///
/// Returns the adjusted configuration; `success = false` means some loop could
/// not restore minimum flow inside its boundary.
pub trait CapacityPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        configuration: &PressureControlConfiguration,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>>;
}

/// One loop around the whole train, solved against the train outlet.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonAsvMinFlow;

impl CapacityPolicy for CommonAsvMinFlow {
    fn name(&self) -> &'static str {
        "common_asv_min_flow"
    }

    fn apply(
        &self,
        configuration: &PressureControlConfiguration,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        if system.loop_count() != 1 {
            return Err(ProcessError::InvalidArg {
                what: "common anti-surge needs exactly one loop",
            });
        }
        let boundary = system.recirculation_boundary(0, configuration)?;
        let solution = RecirculationSolver::new(boundary, None, strategies).solve(&mut |c| {
            system.evaluate(&configuration.with_recirculation_rate(0, c.recirculation_rate))
        })?;
        Ok(solution.map(|c| configuration.with_recirculation_rate(0, c.recirculation_rate)))
    }
}

/// One loop per stage, solved upstream to downstream against each loop outlet.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndividualAsvMinFlow;

impl CapacityPolicy for IndividualAsvMinFlow {
    fn name(&self) -> &'static str {
        "individual_asv_min_flow"
    }

    fn apply(
        &self,
        configuration: &PressureControlConfiguration,
        system: &mut dyn SystemEvaluator,
        strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        let mut current = configuration.clone();
        for index in 0..system.loop_count() {
            let boundary = system.recirculation_boundary(index, &current)?;
            let solution =
                RecirculationSolver::new(boundary, None, strategies).solve(&mut |c| {
                    let candidate = current.with_recirculation_rate(index, c.recirculation_rate);
                    system.evaluate_through_loop(&candidate, index)
                })?;
            current = current.with_recirculation_rate(index, solution.configuration.recirculation_rate);
            if !solution.success {
                tracing::debug!(loop_index = index, "minimum flow not restored");
                return Ok(Solution::failure(current));
            }
        }
        Ok(Solution::success(current))
    }
}

/// Registry of capacity policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CapacityPolicyKind {
    CommonAsvMinFlow,
    IndividualAsvMinFlow,
}

impl CapacityPolicyKind {
    pub fn build(self) -> Box<dyn CapacityPolicy> {
        match self {
            CapacityPolicyKind::CommonAsvMinFlow => Box::new(CommonAsvMinFlow),
            CapacityPolicyKind::IndividualAsvMinFlow => Box::new(IndividualAsvMinFlow),
        }
    }
}

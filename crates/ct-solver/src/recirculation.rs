//! Inner loop: recirculation rate at fixed speed.

use crate::configuration::{RecirculationConfiguration, Solution};
use crate::search::SearchStrategies;
use ct_core::{Boundary, FloatConstraint};
use ct_fluids::FluidStream;
use ct_process::ProcessResult;

/// Finds the recirculation rate that restores minimum flow and, with a target,
/// the rate that brings outlet pressure down to it.
///
/// Unreachable targets and boundaries without a feasible rate resolve to
/// `success = false` with the closest configuration. `RateTooHigh` is never
/// handled here: recirculation only adds flow.
pub struct RecirculationSolver<'a> {
    boundary: Boundary,
    target_pressure: Option<FloatConstraint>,
    strategies: &'a SearchStrategies,
}

fn rate(recirculation_rate: f64) -> RecirculationConfiguration {
    RecirculationConfiguration { recirculation_rate }
}

impl<'a> RecirculationSolver<'a> {
    pub fn new(
        boundary: Boundary,
        target_pressure: Option<FloatConstraint>,
        strategies: &'a SearchStrategies,
    ) -> Self {
        Self {
            boundary,
            target_pressure,
            strategies,
        }
    }

    pub fn solve(
        &self,
        evaluate: &mut dyn FnMut(&RecirculationConfiguration) -> ProcessResult<FluidStream>,
    ) -> ProcessResult<Solution<RecirculationConfiguration>> {
        let feasible = self.minimum_feasible_rate(evaluate)?;
        match self.target_pressure {
            Some(target) if feasible.success => self.solve_for_target(
                target,
                feasible.configuration.recirculation_rate,
                evaluate,
            ),
            _ => Ok(feasible),
        }
    }

    /// Smallest rate in the boundary that does not raise `RateTooLow`.
    fn minimum_feasible_rate(
        &self,
        evaluate: &mut dyn FnMut(&RecirculationConfiguration) -> ProcessResult<FluidStream>,
    ) -> ProcessResult<Solution<RecirculationConfiguration>> {
        match evaluate(&rate(self.boundary.min())) {
            Ok(_) => return Ok(Solution::success(rate(self.boundary.min()))),
            Err(e) if e.is_rate_too_low() => {}
            Err(e) => return Err(e),
        }

        // overshooting into stonewall still counts as "not too low"
        let threshold = self.strategies.search.search(self.boundary, &mut |r| {
            match evaluate(&rate(r)) {
                Ok(_) => Ok(false),
                Err(e) if e.is_rate_too_low() => Ok(true),
                Err(e) if e.is_rate_too_high() => Ok(false),
                Err(e) => Err(e),
            }
        })?;

        match threshold.first_false {
            Some(r) => Ok(Solution::success(rate(r))),
            None => {
                tracing::debug!(
                    max = self.boundary.max(),
                    "rate too low even at maximum recirculation"
                );
                Ok(Solution::failure(rate(self.boundary.max())))
            }
        }
    }

    fn solve_for_target(
        &self,
        target: FloatConstraint,
        minimum_rate: f64,
        evaluate: &mut dyn FnMut(&RecirculationConfiguration) -> ProcessResult<FluidStream>,
    ) -> ProcessResult<Solution<RecirculationConfiguration>> {
        let p_min = evaluate(&rate(minimum_rate))?.pressure_bara();
        if p_min <= target.value || target.is_met(p_min) {
            // more recirculation only lowers the pressure further
            return Ok(Solution::new(target.is_met(p_min), rate(minimum_rate)));
        }

        let search_boundary = self.boundary.with_min(minimum_rate);
        let maximum_rate = largest_below_stonewall(self.strategies, search_boundary, &mut |r| {
            evaluate(&rate(r))
        })?;
        let p_max = evaluate(&rate(maximum_rate))?.pressure_bara();
        if p_max > target.value {
            return Ok(Solution::new(target.is_met(p_max), rate(maximum_rate)));
        }

        let outcome = self.strategies.root_finding.find_root(
            Boundary::new(minimum_rate, maximum_rate)?,
            target.abs_tol,
            &mut |r| Ok(evaluate(&rate(r))?.pressure_bara() - target.value),
        )?;
        let p = evaluate(&rate(outcome.x))?.pressure_bara();
        Ok(Solution::new(target.is_met(p), rate(outcome.x)))
    }
}

/// Largest value in `boundary` whose evaluation does not raise `RateTooHigh`,
/// assuming `boundary.min()` does not.
pub(crate) fn largest_below_stonewall<T>(
    strategies: &SearchStrategies,
    boundary: Boundary,
    evaluate: &mut dyn FnMut(f64) -> ProcessResult<T>,
) -> ProcessResult<f64> {
    match evaluate(boundary.max()) {
        Ok(_) => return Ok(boundary.max()),
        Err(e) if e.is_rate_too_high() => {}
        Err(e) => return Err(e),
    }
    let threshold = strategies.search.search(boundary, &mut |x| match evaluate(x) {
        Ok(_) => Ok(true),
        Err(e) if e.is_rate_too_high() => Ok(false),
        Err(e) => Err(e),
    })?;
    Ok(threshold.last_true.unwrap_or(boundary.min()))
}

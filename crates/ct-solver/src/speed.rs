//! Outer loop: shaft speed for a target outlet pressure.

use crate::configuration::{Solution, SpeedConfiguration};
use crate::search::SearchStrategies;
use ct_core::{Boundary, FloatConstraint};
use ct_fluids::FluidStream;
use ct_process::{ProcessError, ProcessResult};

/// How a speed evaluation turned out.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Probe {
    /// `RateTooHigh`: the machine cannot pass the flow, speed must rise.
    TooSlow,
    /// `RateTooLow` or `OutsideCapacity`: speed must fall.
    TooFast,
    /// Outlet pressure [bara].
    Feasible(f64),
}

fn classify(result: ProcessResult<FluidStream>) -> ProcessResult<Probe> {
    match result {
        Ok(outlet) => Ok(Probe::Feasible(outlet.pressure_bara())),
        Err(e) if e.is_rate_too_high() => Ok(Probe::TooSlow),
        Err(e) if e.is_rate_too_low() || e.is_outside_capacity() => Ok(Probe::TooFast),
        Err(e) => Err(e),
    }
}

/// Finds the speed whose outlet pressure meets the target.
///
/// The speed function is expected to run the capacity policy internally, so a
/// feasible evaluation already has minimum flow restored. Outlet pressure is
/// assumed to rise with speed.
pub struct SpeedSolver<'a> {
    boundary: Boundary,
    target_pressure: FloatConstraint,
    strategies: &'a SearchStrategies,
}

impl<'a> SpeedSolver<'a> {
    pub fn new(
        boundary: Boundary,
        target_pressure: FloatConstraint,
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
        speed_func: &mut dyn FnMut(&SpeedConfiguration) -> ProcessResult<FluidStream>,
    ) -> ProcessResult<Solution<SpeedConfiguration>> {
        let at = |speed: f64| SpeedConfiguration { speed };
        let mut probe = |speed: f64| classify(speed_func(&at(speed)));
        let target = self.target_pressure;

        let Some((lo, p_lo)) = self.lowest_feasible(&mut probe)? else {
            return Ok(Solution::failure(at(self.infeasible_fallback(&mut probe)?)));
        };
        let (hi, p_hi) = self.highest_feasible(lo, p_lo, &mut probe)?;
        if p_hi < p_lo {
            tracing::warn!(lo, hi, p_lo, p_hi, "outlet pressure falls with speed");
        }

        if p_hi < target.value {
            tracing::debug!(speed = hi, pressure = p_hi, target = target.value, "target above reach");
            return Ok(Solution::new(target.is_met(p_hi), at(hi)));
        }
        if p_lo >= target.value {
            // surplus at minimum speed is left to the pressure control policy
            return Ok(Solution::success(at(lo)));
        }

        let result = self.strategies.root_finding.find_root(
            Boundary::new(lo, hi)?,
            target.abs_tol,
            &mut |speed| match probe(speed)? {
                Probe::Feasible(p) => Ok(p - target.value),
                _ => Err(ProcessError::OutsideCapacity {
                    what: "speed became infeasible inside the feasible bracket",
                }),
            },
        );
        match result {
            Ok(outcome) => Ok(Solution::new(
                outcome.converged && outcome.residual.abs() <= target.abs_tol,
                at(outcome.x),
            )),
            Err(e) if e.is_outside_capacity() => {
                tracing::warn!(lo, hi, error = %e, "speed search left the feasible range");
                Ok(Solution::failure(at(hi)))
            }
            Err(e) => Err(e),
        }
    }

    /// Lowest speed that is neither too slow nor too fast, with its pressure.
    fn lowest_feasible(
        &self,
        probe: &mut dyn FnMut(f64) -> ProcessResult<Probe>,
    ) -> ProcessResult<Option<(f64, f64)>> {
        let min = self.boundary.min();
        let speed = match probe(min)? {
            Probe::Feasible(p) => return Ok(Some((min, p))),
            Probe::TooFast => return Ok(None),
            Probe::TooSlow => {
                let threshold = self
                    .strategies
                    .search
                    .search(self.boundary, &mut |s| Ok(probe(s)? == Probe::TooSlow))?;
                match threshold.first_false {
                    Some(s) => s,
                    None => return Ok(None),
                }
            }
        };
        match probe(speed)? {
            Probe::Feasible(p) => Ok(Some((speed, p))),
            _ => Ok(None),
        }
    }

    /// Highest speed above `lo` that is not too fast.
    fn highest_feasible(
        &self,
        lo: f64,
        p_lo: f64,
        probe: &mut dyn FnMut(f64) -> ProcessResult<Probe>,
    ) -> ProcessResult<(f64, f64)> {
        let max = self.boundary.max();
        if lo >= max {
            return Ok((lo, p_lo));
        }
        match probe(max)? {
            Probe::Feasible(p) => return Ok((max, p)),
            Probe::TooSlow => {
                tracing::warn!(lo, max, "too slow at maximum speed but feasible below it");
                return Ok((lo, p_lo));
            }
            Probe::TooFast => {}
        }
        let bracket = self.boundary.with_min(lo);
        let threshold = self
            .strategies
            .search
            .search(bracket, &mut |s| Ok(probe(s)? != Probe::TooFast))?;
        let speed = threshold.last_true.unwrap_or(lo);
        match probe(speed)? {
            Probe::Feasible(p) => Ok((speed, p)),
            _ => Ok((lo, p_lo)),
        }
    }

    /// Closest speed to report when no speed is feasible: maximum when the
    /// machine is too slow everywhere, minimum when it is too fast.
    fn infeasible_fallback(
        &self,
        probe: &mut dyn FnMut(f64) -> ProcessResult<Probe>,
    ) -> ProcessResult<f64> {
        let min = self.boundary.min();
        let speed = match probe(min)? {
            Probe::TooFast => min,
            _ => self.boundary.max(),
        };
        tracing::debug!(speed, "no feasible speed in the boundary");
        Ok(speed)
    }
}

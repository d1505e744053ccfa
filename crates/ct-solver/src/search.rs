//! Bisection search for the threshold of a monotone feasibility predicate.

use crate::config::{SearchConfig, TrainSolverConfig};
use crate::root_finding::{BrentRootFinding, RootFindingStrategy};
use ct_core::Boundary;
use ct_process::ProcessResult;

/// Where a monotone predicate switches from `true` to `false`.
///
/// `last_true` is `None` when the predicate is false at `boundary.min`;
/// `first_false` is `None` when it is true at `boundary.max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub last_true: Option<f64>,
    pub first_false: Option<f64>,
}

/// Boolean feasibility search over a boundary.
///
/// The predicate is assumed true for `x <= threshold` and false above.
/// Predicate errors propagate unchanged.
pub trait SearchStrategy: Send + Sync {
    fn search(
        &self,
        boundary: Boundary,
        predicate: &mut dyn FnMut(f64) -> ProcessResult<bool>,
    ) -> ProcessResult<Threshold>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BisectionSearch {
    config: SearchConfig,
}

impl BisectionSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }
}

impl SearchStrategy for BisectionSearch {
    fn search(
        &self,
        boundary: Boundary,
        predicate: &mut dyn FnMut(f64) -> ProcessResult<bool>,
    ) -> ProcessResult<Threshold> {
        let (min, max) = (boundary.min(), boundary.max());
        let at_min = predicate(min)?;
        let at_max = if max == min { at_min } else { predicate(max)? };

        match (at_min, at_max) {
            (true, true) => {
                return Ok(Threshold {
                    last_true: Some(max),
                    first_false: None,
                });
            }
            (false, false) => {
                return Ok(Threshold {
                    last_true: None,
                    first_false: Some(min),
                });
            }
            (false, true) => {
                tracing::warn!(
                    min,
                    max,
                    "feasibility predicate is false below and true above; not monotone"
                );
                return Ok(Threshold {
                    last_true: None,
                    first_false: Some(min),
                });
            }
            (true, false) => {}
        }

        let mut lo = min;
        let mut hi = max;
        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            let scale = lo.abs().max(hi.abs()).max(f64::MIN_POSITIVE);
            if hi - lo <= self.config.relative_tolerance * scale {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if predicate(mid)? {
                lo = mid;
            } else {
                hi = mid;
            }
            iterations += 1;
        }
        tracing::trace!(lo, hi, iterations, "bisection search finished");

        Ok(Threshold {
            last_true: Some(lo),
            first_false: Some(hi),
        })
    }
}

/// The strategies a solve uses, built once from `TrainSolverConfig`.
pub struct SearchStrategies {
    pub search: Box<dyn SearchStrategy>,
    pub root_finding: Box<dyn RootFindingStrategy>,
}

impl SearchStrategies {
    pub fn from_config(config: &TrainSolverConfig) -> Self {
        Self {
            search: Box::new(BisectionSearch::new(config.search)),
            root_finding: Box::new(BrentRootFinding::new(config.root_finding)),
        }
    }
}

impl Default for SearchStrategies {
    fn default() -> Self {
        Self::from_config(&TrainSolverConfig::default())
    }
}

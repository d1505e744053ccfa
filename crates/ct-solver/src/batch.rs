//! Time-series evaluation across threads.

use crate::error::SolverResult;
use crate::train_solver::{TrainSolution, TrainSolver};
use ct_core::FloatConstraint;
use ct_fluids::FluidStream;
use rayon::prelude::*;

/// One period of a production profile.
#[derive(Clone, Debug)]
pub struct TimeStep {
    pub inlet: FluidStream,
    pub target: FloatConstraint,
}

/// Solve every time step independently, in parallel.
///
/// Each step gets its own solver from `build_solver`, since a train carries
/// mutable session state. Results come back in input order.
pub fn evaluate_time_series<F>(steps: &[TimeStep], build_solver: F) -> Vec<SolverResult<TrainSolution>>
where
    F: Fn() -> SolverResult<TrainSolver> + Sync,
{
    steps
        .par_iter()
        .map(|step| {
            let mut solver = build_solver()?;
            solver.solve(step.target, &step.inlet)
        })
        .collect()
}

//! Train-level orchestration: one entry point per pressure-control strategy.

use crate::capacity::CapacityPolicy;
use crate::config::TrainSolverConfig;
use crate::configuration::{
    ChokeConfiguration, PressureControlConfiguration, RecirculationConfiguration, Solution,
    SpeedConfiguration,
};
use crate::error::{SolverError, SolverResult};
use crate::pressure_control::{PressureControlKind, PressureControlPolicy};
use crate::pressure_control_solver::{PressureControlOutcome, PressureControlSolver};
use crate::search::{BisectionSearch, SearchStrategies, SearchStrategy};
use crate::train::{CompressorTrain, LoopLayout, TrainLayout, TrainSession};
use ct_core::units::Power;
use ct_core::{Boundary, FloatConstraint};
use ct_fluids::FluidStream;
use ct_process::{CompressorStage, ProcessError, RecirculationLoop};

/// Operating point found for one inlet and target.
///
/// `configuration` reproduces the solved outlet when passed back to
/// [`TrainSolver::propagate`] with the same inlet.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainSolution {
    pub success: bool,
    pub speed: Solution<SpeedConfiguration>,
    /// One entry per loop, in flow order. Each loop succeeds when minimum
    /// flow was restored at the chosen speed, even if the target was missed.
    pub recirculation: Vec<Solution<RecirculationConfiguration>>,
    pub choke: ChokeConfiguration,
    pub configuration: PressureControlConfiguration,
}

impl TrainSolution {
    fn from_outcome(outcome: PressureControlOutcome) -> Self {
        let success = outcome.solution.success;
        let configuration = outcome.solution.configuration;
        let recirculation = configuration
            .recirculation_rates
            .iter()
            .map(|&recirculation_rate| {
                Solution::new(
                    outcome.minimum_flow_restored,
                    RecirculationConfiguration { recirculation_rate },
                )
            })
            .collect();
        Self {
            success,
            speed: outcome.speed,
            recirculation,
            choke: configuration.choke,
            configuration,
        }
    }
}

/// A compressor train with its capacity and pressure-control policies.
pub struct TrainSolver {
    train: CompressorTrain,
    kind: PressureControlKind,
    capacity: Box<dyn CapacityPolicy>,
    pressure_control: Box<dyn PressureControlPolicy>,
    strategies: SearchStrategies,
    config: TrainSolverConfig,
}

impl TrainSolver {
    pub fn new(
        stages: Vec<CompressorStage>,
        kind: PressureControlKind,
        config: TrainSolverConfig,
    ) -> SolverResult<Self> {
        Self::with_layout(stages, kind, TrainLayout::for_kind(kind), config)
    }

    /// Like [`TrainSolver::new`] with an explicit layout, e.g. to cap loop
    /// recirculation. The layout must carry what `kind` acts on.
    pub fn with_layout(
        stages: Vec<CompressorStage>,
        kind: PressureControlKind,
        layout: TrainLayout,
        config: TrainSolverConfig,
    ) -> SolverResult<Self> {
        let common = layout.loops == LoopLayout::Common;
        if kind.uses_common_loop() != common {
            return Err(SolverError::Setup {
                what: format!("{kind:?} does not fit a {:?} loop layout", layout.loops),
            });
        }
        if (kind == PressureControlKind::UpstreamChoke && !layout.upstream_choke)
            || (kind == PressureControlKind::DownstreamChoke && !layout.downstream_choke)
        {
            return Err(SolverError::Setup {
                what: format!("{kind:?} needs its choke in the layout"),
            });
        }
        Ok(Self {
            train: CompressorTrain::new(stages, layout)?,
            kind,
            capacity: kind.capacity_policy().build(),
            pressure_control: kind.build(),
            strategies: SearchStrategies::from_config(&config),
            config,
        })
    }

    pub fn kind(&self) -> PressureControlKind {
        self.kind
    }

    pub fn train(&self) -> &CompressorTrain {
        &self.train
    }

    pub fn recirculation_loops(&self) -> &[RecirculationLoop] {
        self.train.loops()
    }

    /// Speed and control configuration whose outlet pressure meets `target`.
    ///
    /// An unreachable target or a failed propagation is `Ok` with
    /// `success = false`; `Err` is reserved for invalid input.
    pub fn solve(
        &mut self,
        target: FloatConstraint,
        inlet: &FluidStream,
    ) -> SolverResult<TrainSolution> {
        if inlet.standard_rate() <= 0.0 {
            return Err(SolverError::InvalidArg {
                what: "inlet standard rate must be positive",
            });
        }
        let solver = PressureControlSolver::new(
            self.capacity.as_ref(),
            self.pressure_control.as_ref(),
            &self.strategies,
            self.train.speed_boundary(),
        );
        let mut session = TrainSession::new(&mut self.train, inlet.clone());
        let outcome = solver.solve(target, &mut session)?;
        let solution = TrainSolution::from_outcome(outcome);
        tracing::debug!(
            policy = self.pressure_control.name(),
            success = solution.success,
            speed = solution.speed.configuration.speed,
            target = target.value,
            "train solved"
        );
        Ok(solution)
    }

    /// Configuration at `speed` with minimum flow restored and no pressure
    /// control applied.
    pub fn capacity_baseline(
        &mut self,
        speed: f64,
        inlet: &FluidStream,
    ) -> SolverResult<PressureControlConfiguration> {
        let solver = PressureControlSolver::new(
            self.capacity.as_ref(),
            self.pressure_control.as_ref(),
            &self.strategies,
            self.train.speed_boundary(),
        );
        let mut session = TrainSession::new(&mut self.train, inlet.clone());
        Ok(solver.capacity_baseline(speed, &mut session)?)
    }

    /// Allowed recirculation for loop `loop_index` under `configuration`.
    pub fn recirculation_boundary(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
        loop_index: usize,
    ) -> SolverResult<Boundary> {
        Ok(self
            .train
            .recirculation_boundary(configuration, inlet, loop_index)?)
    }

    pub fn propagate(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
    ) -> SolverResult<FluidStream> {
        Ok(self.train.propagate(configuration, inlet)?)
    }

    pub fn shaft_power(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
    ) -> SolverResult<Power> {
        Ok(self.train.shaft_power(configuration, inlet)?)
    }

    /// Largest standard rate [Sm³/day] in `rate_boundary` the train can take
    /// while still meeting `target`, or `None` if even the smallest fails.
    pub fn maximum_standard_rate(
        &mut self,
        target: FloatConstraint,
        inlet: &FluidStream,
        rate_boundary: Boundary,
    ) -> SolverResult<Option<f64>> {
        if rate_boundary.min() <= 0.0 {
            return Err(SolverError::InvalidArg {
                what: "rate boundary must be positive",
            });
        }
        let search = BisectionSearch::new(self.config.search);
        let threshold = search.search(rate_boundary, &mut |rate| {
            let stream = inlet.with_standard_rate(rate)?;
            match self.solve(target, &stream) {
                Ok(solution) => Ok(solution.success),
                Err(SolverError::Process(e))
                    if e.is_rate_too_high() || e.is_rate_too_low() || e.is_outside_capacity() =>
                {
                    Ok(false)
                }
                Err(SolverError::Process(e)) => Err(e),
                Err(SolverError::InvalidArg { what }) => Err(ProcessError::InvalidArg { what }),
                Err(SolverError::Setup { .. }) => Ok(false),
            }
        })?;
        Ok(threshold.last_true)
    }
}

macro_rules! train_orchestrator {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $find:ident) => {
        $(#[$doc])*
        pub struct $name {
            solver: TrainSolver,
        }

        impl $name {
            pub fn new(
                stages: Vec<CompressorStage>,
                config: TrainSolverConfig,
            ) -> SolverResult<Self> {
                Ok(Self {
                    solver: TrainSolver::new(stages, $kind, config)?,
                })
            }

            pub fn $find(
                &mut self,
                target: FloatConstraint,
                inlet: &FluidStream,
            ) -> SolverResult<TrainSolution> {
                self.solver.solve(target, inlet)
            }

            pub fn recirculation_loops(&self) -> &[RecirculationLoop] {
                self.solver.recirculation_loops()
            }

            pub fn solver(&self) -> &TrainSolver {
                &self.solver
            }

            pub fn solver_mut(&mut self) -> &mut TrainSolver {
                &mut self.solver
            }
        }
    };
}

train_orchestrator!(
    /// Single loop around the whole train.
    CommonAsvSolver,
    PressureControlKind::CommonAsv,
    find_common_asv_solution
);
train_orchestrator!(
    /// Loop per stage, opened by a common fraction of headroom.
    IndividualAsvRateSolver,
    PressureControlKind::IndividualAsvRate,
    find_individual_asv_rate_solution
);
train_orchestrator!(
    /// Loop per stage, each taking an equal share of the pressure ratio.
    IndividualAsvPressureSolver,
    PressureControlKind::IndividualAsvPressure,
    find_individual_asv_pressure_solution
);
train_orchestrator!(
    /// Suction throttling ahead of the first stage.
    UpstreamChokeSolver,
    PressureControlKind::UpstreamChoke,
    find_upstream_choke_solution
);
train_orchestrator!(
    /// Discharge throttling after the last stage.
    DownstreamChokeSolver,
    PressureControlKind::DownstreamChoke,
    find_downstream_choke_solution
);

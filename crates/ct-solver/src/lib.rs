//! Operating-point solver for compressor trains.
//!
//! Given an inlet stream and a target outlet pressure, finds the shaft speed,
//! anti-surge recirculation and choke settings that deliver it:
//!
//! 1. Speed search. Every probed speed first restores minimum flow through the
//!    capacity policy (`CommonAsvMinFlow` or `IndividualAsvMinFlow`).
//! 2. Pressure control at the chosen speed when outlet pressure is still above
//!    target (`PressureControlKind`).
//!
//! An unreachable target is not an error: solutions carry `success = false`
//! with the closest configuration found. The building blocks are exposed too:
//! `BisectionSearch`, `BrentRootFinding`, `RecirculationSolver` and
//! `SpeedSolver` work on any closure over a configuration.

pub mod batch;
pub mod capacity;
pub mod config;
pub mod configuration;
pub mod error;
pub mod evaluator;
pub mod pressure_control;
pub mod pressure_control_solver;
pub mod recirculation;
pub mod root_finding;
pub mod search;
pub mod speed;
pub mod train;
pub mod train_solver;

pub use batch::{TimeStep, evaluate_time_series};
pub use capacity::{CapacityPolicy, CapacityPolicyKind, CommonAsvMinFlow, IndividualAsvMinFlow};
pub use config::{RootFindingConfig, SearchConfig, TrainSolverConfig};
pub use configuration::{
    ChokeConfiguration, PressureControlConfiguration, RecirculationConfiguration, Solution,
    SpeedConfiguration,
};
pub use error::{SolverError, SolverResult};
pub use evaluator::SystemEvaluator;
pub use pressure_control::{
    CommonAsv, DownstreamChoke, IndividualAsvPressure, IndividualAsvRate,
    MINIMUM_SUCTION_PRESSURE_BARA, PressureControlKind, PressureControlPolicy, UpstreamChoke,
};
pub use pressure_control_solver::{PressureControlOutcome, PressureControlSolver};
pub use recirculation::RecirculationSolver;
pub use root_finding::{BrentRootFinding, RootFindingStrategy, RootOutcome};
pub use search::{BisectionSearch, SearchStrategies, SearchStrategy, Threshold};
pub use speed::SpeedSolver;
pub use train::{CompressorTrain, LoopLayout, TrainLayout, TrainSession};
pub use train_solver::{
    CommonAsvSolver, DownstreamChokeSolver, IndividualAsvPressureSolver, IndividualAsvRateSolver,
    TrainSolution, TrainSolver, UpstreamChokeSolver,
};

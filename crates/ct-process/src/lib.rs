//! ct-process: process pipeline for compressor trains.
//!
//! Provides:
//! - `ProcessUnit` trait: `propagate(inlet, state) -> outlet`
//! - `ProcessSystem`: ordered pipeline of units
//! - `ProcessState` / `Shaft`: explicit session state (speed, loop rates, chokes)
//! - `CompressorChart` and `CompressorStage`
//! - Stage outlet convergence (damped fixed-point iteration)
//! - `RecirculationLoop` (anti-surge) and `Choke`
//!
//! Units never mutate state. A solver owns the `ProcessState`, sets speed and
//! loop rates, then propagates; the type system keeps one state per solve.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ct_core::units::{bara, k};
//! use ct_core::LoopId;
//! use ct_fluids::{Composition, FluidStream, VirialGasModel};
//! use ct_process::{
//!     ChartCurve, CompressorChart, CompressorStage, ProcessState, ProcessSystem,
//!     ProcessUnit, RecirculationLoop,
//! };
//!
//! let chart = CompressorChart::single_speed(
//!     ChartCurve::new(
//!         9000.0,
//!         vec![500.0, 1500.0, 2500.0],
//!         vec![80_000.0, 70_000.0, 50_000.0],
//!         vec![0.75, 0.78, 0.72],
//!     )
//!     .unwrap(),
//! );
//! let stage = CompressorStage::new("stage 1", chart);
//! let asv = RecirculationLoop::new(
//!     "asv",
//!     LoopId::from_index(0),
//!     ProcessSystem::new("stage 1").with_unit(stage),
//! );
//!
//! let mut state = ProcessState::new(1, 0);
//! state.set_speed(9000.0).unwrap();
//!
//! let inlet = FluidStream::create_stream_from_standard_rate(
//!     Arc::new(VirialGasModel::new()),
//!     Composition::dry_gas(),
//!     bara(30.0),
//!     k(300.0),
//!     1.0e6,
//! )
//! .unwrap();
//! let outlet = asv.propagate(&inlet, &state).unwrap();
//! assert!(outlet.pressure_bara() > 30.0);
//! ```

pub mod chart;
pub mod choke;
pub mod convergence;
pub mod error;
pub mod recirculation;
pub mod stage;
pub mod state;
pub mod system;
pub mod unit;

pub use chart::{ChartCurve, CompressorChart};
pub use choke::Choke;
pub use convergence::{
    AdaptiveRelaxation, OutletConvergence, OutletConvergenceConfig, converge_outlet,
};
pub use error::{ProcessError, ProcessResult};
pub use recirculation::RecirculationLoop;
pub use stage::{CompressorStage, OperatingPoint};
pub use state::{ProcessState, Shaft};
pub use system::ProcessSystem;
pub use unit::ProcessUnit;

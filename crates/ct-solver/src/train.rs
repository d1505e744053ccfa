//! Compressor train assembly and its evaluation session.

use crate::configuration::PressureControlConfiguration;
use crate::error::{SolverError, SolverResult};
use crate::evaluator::SystemEvaluator;
use crate::pressure_control::PressureControlKind;
use ct_core::units::{Power, watt};
use ct_core::{Boundary, ChokeId, LoopId};
use ct_fluids::FluidStream;
use ct_process::{
    Choke, CompressorStage, ProcessError, ProcessResult, ProcessState, ProcessSystem, ProcessUnit,
    RecirculationLoop,
};

const UPSTREAM_CHOKE: u32 = 0;
const DOWNSTREAM_CHOKE: u32 = 1;
const CHOKE_SLOTS: usize = 2;

/// How anti-surge loops wrap the stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopLayout {
    /// One loop from the train outlet back to the first stage.
    Common,
    /// One loop around each stage.
    PerStage,
}

/// Loops and chokes around the stages of a train.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainLayout {
    pub loops: LoopLayout,
    pub upstream_choke: bool,
    pub downstream_choke: bool,
    /// Cap on every loop's recirculation [Sm³/day]
    pub maximum_recirculation_rate: Option<f64>,
}

impl TrainLayout {
    /// Layout a pressure-control policy acts on.
    pub fn for_kind(kind: PressureControlKind) -> Self {
        Self {
            loops: if kind.uses_common_loop() {
                LoopLayout::Common
            } else {
                LoopLayout::PerStage
            },
            upstream_choke: kind == PressureControlKind::UpstreamChoke,
            downstream_choke: kind == PressureControlKind::DownstreamChoke,
            maximum_recirculation_rate: None,
        }
    }

    pub fn with_maximum_recirculation_rate(mut self, rate: f64) -> Self {
        self.maximum_recirculation_rate = Some(rate);
        self
    }
}

/// Stages on one shaft, wrapped in anti-surge loops, with optional chokes.
///
/// The train owns its `ProcessState`. Every propagation first applies a full
/// `PressureControlConfiguration`, so evaluations are order independent.
#[derive(Debug)]
pub struct CompressorTrain {
    upstream_choke: Option<Choke>,
    loops: Vec<RecirculationLoop>,
    downstream_choke: Option<Choke>,
    speed_boundary: Boundary,
    state: ProcessState,
}

impl CompressorTrain {
    pub fn new(stages: Vec<CompressorStage>, layout: TrainLayout) -> SolverResult<Self> {
        if stages.is_empty() {
            return Err(SolverError::Setup {
                what: "a train needs at least one stage".into(),
            });
        }
        if let Some(cap) = layout.maximum_recirculation_rate
            && !(cap.is_finite() && cap >= 0.0)
        {
            return Err(SolverError::InvalidArg {
                what: "maximum recirculation rate must be finite and non-negative",
            });
        }

        let mut speed_boundary = stages[0].chart().speed_boundary()?;
        for stage in &stages[1..] {
            let boundary = stage.chart().speed_boundary()?;
            speed_boundary = speed_boundary.intersect(&boundary).ok_or_else(|| {
                SolverError::Setup {
                    what: format!(
                        "speed range of {} does not overlap the rest of the train",
                        stage.name()
                    ),
                }
            })?;
        }

        let wrap = |index: u32, system: ProcessSystem| {
            let asv = RecirculationLoop::new(
                format!("asv {}", index + 1),
                LoopId::from_index(index),
                system,
            );
            match layout.maximum_recirculation_rate {
                Some(cap) => asv.with_maximum_recirculation_rate(cap),
                None => asv,
            }
        };
        let loops = match layout.loops {
            LoopLayout::Common => {
                let mut system = ProcessSystem::new("train");
                for stage in stages {
                    system.push(stage);
                }
                vec![wrap(0, system)]
            }
            LoopLayout::PerStage => stages
                .into_iter()
                .zip(0u32..)
                .map(|(stage, index)| {
                    let name = stage.name().to_string();
                    wrap(index, ProcessSystem::new(name).with_unit(stage))
                })
                .collect(),
        };

        let upstream_choke = layout
            .upstream_choke
            .then(|| Choke::new("upstream choke", ChokeId::from_index(UPSTREAM_CHOKE)));
        let downstream_choke = layout
            .downstream_choke
            .then(|| Choke::new("downstream choke", ChokeId::from_index(DOWNSTREAM_CHOKE)));

        tracing::debug!(
            loops = loops.len(),
            min_speed = speed_boundary.min(),
            max_speed = speed_boundary.max(),
            "compressor train assembled"
        );
        Ok(Self {
            upstream_choke,
            state: ProcessState::new(loops.len(), CHOKE_SLOTS),
            loops,
            downstream_choke,
            speed_boundary,
        })
    }

    /// Speeds every stage chart covers [rpm].
    pub fn speed_boundary(&self) -> Boundary {
        self.speed_boundary
    }

    pub fn loops(&self) -> &[RecirculationLoop] {
        &self.loops
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// State as left by the last propagation.
    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    fn apply(&mut self, configuration: &PressureControlConfiguration) -> ProcessResult<()> {
        self.state.set_speed(configuration.speed)?;
        self.state
            .set_recirculation_rates(&configuration.recirculation_rates)?;

        let drops = [
            (&self.upstream_choke, UPSTREAM_CHOKE, configuration.choke.upstream_pressure_drop),
            (&self.downstream_choke, DOWNSTREAM_CHOKE, configuration.choke.downstream_pressure_drop),
        ];
        for (choke, slot, drop) in drops {
            if choke.is_none() && drop != 0.0 {
                return Err(ProcessError::InvalidArg {
                    what: "configuration throttles a choke the train does not have",
                });
            }
            self.state
                .set_choke_pressure_drop(ChokeId::from_index(slot), drop)?;
        }
        Ok(())
    }

    fn suction(&self, inlet: &FluidStream) -> ProcessResult<FluidStream> {
        match &self.upstream_choke {
            Some(choke) => choke.propagate(inlet, &self.state),
            None => Ok(inlet.clone()),
        }
    }

    fn check_loop(&self, loop_index: usize) -> ProcessResult<()> {
        if loop_index >= self.loops.len() {
            return Err(ProcessError::InvalidArg {
                what: "loop index out of range",
            });
        }
        Ok(())
    }

    /// Stream entering loop `loop_index`.
    pub fn loop_inlet(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
        loop_index: usize,
    ) -> ProcessResult<FluidStream> {
        self.check_loop(loop_index)?;
        self.apply(configuration)?;
        let mut stream = self.suction(inlet)?;
        for asv in &self.loops[..loop_index] {
            stream = asv.propagate(&stream, &self.state)?;
        }
        Ok(stream)
    }

    /// Outlet of loop `loop_index`.
    pub fn propagate_through_loop(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
        loop_index: usize,
    ) -> ProcessResult<FluidStream> {
        let stream = self.loop_inlet(configuration, inlet, loop_index)?;
        self.loops[loop_index].propagate(&stream, &self.state)
    }

    /// Train outlet, downstream choke included.
    pub fn propagate(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
    ) -> ProcessResult<FluidStream> {
        self.apply(configuration)?;
        let mut stream = self.suction(inlet)?;
        for asv in &self.loops {
            stream = asv.propagate(&stream, &self.state)?;
        }
        match &self.downstream_choke {
            Some(choke) => choke.propagate(&stream, &self.state),
            None => Ok(stream),
        }
    }

    pub fn recirculation_boundary(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
        loop_index: usize,
    ) -> ProcessResult<Boundary> {
        let stream = self.loop_inlet(configuration, inlet, loop_index)?;
        self.loops[loop_index].recirculation_boundary(&stream, &self.state)
    }

    /// Total shaft power for a configuration.
    pub fn shaft_power(
        &mut self,
        configuration: &PressureControlConfiguration,
        inlet: &FluidStream,
    ) -> ProcessResult<Power> {
        self.apply(configuration)?;
        let mut stream = self.suction(inlet)?;
        let mut total = watt(0.0);
        for asv in &self.loops {
            total += asv.shaft_power(&stream, &self.state)?;
            stream = asv.propagate(&stream, &self.state)?;
        }
        Ok(total)
    }
}

/// A train bound to one inlet stream, as seen by the policies.
pub struct TrainSession<'t> {
    train: &'t mut CompressorTrain,
    inlet: FluidStream,
}

impl<'t> TrainSession<'t> {
    pub fn new(train: &'t mut CompressorTrain, inlet: FluidStream) -> Self {
        Self { train, inlet }
    }
}

impl SystemEvaluator for TrainSession<'_> {
    fn inlet(&self) -> &FluidStream {
        &self.inlet
    }

    fn loop_count(&self) -> usize {
        self.train.loop_count()
    }

    fn recirculation_boundary(
        &mut self,
        loop_index: usize,
        configuration: &PressureControlConfiguration,
    ) -> ProcessResult<Boundary> {
        self.train
            .recirculation_boundary(configuration, &self.inlet, loop_index)
    }

    fn evaluate(
        &mut self,
        configuration: &PressureControlConfiguration,
    ) -> ProcessResult<FluidStream> {
        self.train.propagate(configuration, &self.inlet)
    }

    fn evaluate_through_loop(
        &mut self,
        configuration: &PressureControlConfiguration,
        loop_index: usize,
    ) -> ProcessResult<FluidStream> {
        self.train
            .propagate_through_loop(configuration, &self.inlet, loop_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ChokeConfiguration;
    use ct_core::units::{bara, k};
    use ct_fluids::{Composition, VirialGasModel};
    use ct_process::{ChartCurve, CompressorChart};
    use std::sync::Arc;

    fn stage(name: &str, low: f64, high: f64) -> CompressorStage {
        let curve = |speed| {
            ChartCurve::new(
                speed,
                vec![100.0, 2000.0, 4000.0],
                vec![60_000.0, 52_000.0, 40_000.0],
                vec![0.74, 0.78, 0.72],
            )
            .unwrap()
        };
        CompressorStage::new(name, CompressorChart::new(vec![curve(low), curve(high)]).unwrap())
    }

    fn inlet() -> FluidStream {
        FluidStream::create_stream_from_standard_rate(
            Arc::new(VirialGasModel::new()),
            Composition::dry_gas(),
            bara(30.0),
            k(300.0),
            5.0e5,
        )
        .unwrap()
    }

    #[test]
    fn layout_follows_policy() {
        let common = TrainLayout::for_kind(PressureControlKind::CommonAsv);
        assert_eq!(common.loops, LoopLayout::Common);
        assert!(!common.upstream_choke && !common.downstream_choke);

        let upstream = TrainLayout::for_kind(PressureControlKind::UpstreamChoke);
        assert_eq!(upstream.loops, LoopLayout::PerStage);
        assert!(upstream.upstream_choke && !upstream.downstream_choke);
    }

    #[test]
    fn speed_boundary_is_the_overlap() {
        let layout = TrainLayout::for_kind(PressureControlKind::IndividualAsvRate);
        let train = CompressorTrain::new(
            vec![stage("a", 7000.0, 10000.0), stage("b", 8000.0, 11000.0)],
            layout,
        )
        .unwrap();
        assert_eq!(train.speed_boundary(), Boundary::new(8000.0, 10000.0).unwrap());
        assert_eq!(train.loop_count(), 2);

        let disjoint = CompressorTrain::new(
            vec![stage("a", 7000.0, 8000.0), stage("b", 9000.0, 11000.0)],
            layout,
        );
        assert!(matches!(disjoint, Err(SolverError::Setup { .. })));
        assert!(CompressorTrain::new(vec![], layout).is_err());
    }

    #[test]
    fn missing_choke_cannot_be_throttled() {
        let layout = TrainLayout::for_kind(PressureControlKind::CommonAsv);
        let mut train = CompressorTrain::new(vec![stage("a", 7000.0, 10000.0)], layout).unwrap();
        let configuration = PressureControlConfiguration::at_speed(9000.0, 1).with_choke(
            ChokeConfiguration {
                upstream_pressure_drop: 1.0,
                downstream_pressure_drop: 0.0,
            },
        );
        let err = train.propagate(&configuration, &inlet()).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidArg { .. }));
    }

    #[test]
    fn loop_index_is_checked() {
        let layout = TrainLayout::for_kind(PressureControlKind::IndividualAsvRate);
        let mut train = CompressorTrain::new(vec![stage("a", 7000.0, 10000.0)], layout).unwrap();
        let configuration = PressureControlConfiguration::at_speed(9000.0, 1);
        assert!(train.propagate_through_loop(&configuration, &inlet(), 1).is_err());
        let outlet = train.propagate_through_loop(&configuration, &inlet(), 0).unwrap();
        assert!(outlet.pressure_bara() > 30.0);
        let power = train.shaft_power(&configuration, &inlet()).unwrap();
        assert!(power.value > 0.0);
    }
}

//! Policies and the two-step solver against a linear stand-in train.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ct_core::units::{bara, k};
use ct_core::{Boundary, FloatConstraint};
use ct_fluids::{Composition, FluidStream, Species, VirialGasModel};
use ct_process::{ProcessError, ProcessResult};
use ct_solver::{
    CapacityPolicy, CommonAsv, CommonAsvMinFlow, DownstreamChoke, IndividualAsvMinFlow,
    IndividualAsvPressure, IndividualAsvRate, PressureControlConfiguration, PressureControlPolicy,
    PressureControlSolver, SearchStrategies, Solution, SystemEvaluator, UpstreamChoke,
};

fn stream_at(p_bara: f64) -> FluidStream {
    FluidStream::create_stream_from_standard_rate(
        Arc::new(VirialGasModel::new()),
        Composition::pure(Species::CH4),
        bara(p_bara),
        k(300.0),
        5.0e5,
    )
    .unwrap()
}

/// Each loop adds `0.005 * speed - 0.02 * rate` bar and needs at least
/// `required[i]` recirculation. Below `stonewall_speed` the train chokes.
struct LinearTrain {
    inlet: FluidStream,
    required: Vec<f64>,
    maximum: f64,
    stonewall_speed: f64,
    evaluations: usize,
}

impl LinearTrain {
    fn new(required: Vec<f64>) -> Self {
        Self {
            inlet: stream_at(30.0),
            required,
            maximum: 1000.0,
            stonewall_speed: 0.0,
            evaluations: 0,
        }
    }

    fn pressure_through(
        &mut self,
        configuration: &PressureControlConfiguration,
        last: usize,
    ) -> ProcessResult<f64> {
        self.evaluations += 1;
        if configuration.speed < self.stonewall_speed {
            return Err(ProcessError::RateTooHigh {
                unit: "linear".into(),
                actual_rate: 1.0,
                maximum_rate: 0.0,
            });
        }
        let mut p = self.inlet.pressure_bara() - configuration.choke.upstream_pressure_drop;
        for index in 0..=last {
            let rate = configuration.recirculation_rates[index];
            if rate < self.required[index] {
                return Err(ProcessError::RateTooLow {
                    unit: "linear".into(),
                    actual_rate: rate,
                    minimum_rate: self.required[index],
                });
            }
            p += 0.005 * configuration.speed - 0.02 * rate;
        }
        Ok(p)
    }
}

impl SystemEvaluator for LinearTrain {
    fn inlet(&self) -> &FluidStream {
        &self.inlet
    }

    fn loop_count(&self) -> usize {
        self.required.len()
    }

    fn recirculation_boundary(
        &mut self,
        _loop_index: usize,
        _configuration: &PressureControlConfiguration,
    ) -> ProcessResult<Boundary> {
        Ok(Boundary::new(0.0, self.maximum)?)
    }

    fn evaluate(
        &mut self,
        configuration: &PressureControlConfiguration,
    ) -> ProcessResult<FluidStream> {
        let last = self.loop_count() - 1;
        let p = self.pressure_through(configuration, last)?
            - configuration.choke.downstream_pressure_drop;
        Ok(stream_at(p))
    }

    fn evaluate_through_loop(
        &mut self,
        configuration: &PressureControlConfiguration,
        loop_index: usize,
    ) -> ProcessResult<FluidStream> {
        let p = self.pressure_through(configuration, loop_index)?;
        Ok(stream_at(p))
    }
}

/// Records calls and hands the baseline back unchanged.
#[derive(Default)]
struct CountingPolicy {
    calls: AtomicUsize,
}

impl PressureControlPolicy for CountingPolicy {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn apply(
        &self,
        baseline: &PressureControlConfiguration,
        _target: FloatConstraint,
        _system: &mut dyn SystemEvaluator,
        _strategies: &SearchStrategies,
    ) -> ProcessResult<Solution<PressureControlConfiguration>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Solution::failure(baseline.clone()))
    }
}

fn speeds() -> Boundary {
    Boundary::new(5000.0, 10000.0).unwrap()
}

fn target(value: f64) -> FloatConstraint {
    FloatConstraint::new(value, 1e-2).unwrap()
}

fn outlet_pressure(train: &mut LinearTrain, configuration: &PressureControlConfiguration) -> f64 {
    train.evaluate(configuration).unwrap().pressure_bara()
}

#[test]
fn individual_min_flow_restores_each_loop() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let start = PressureControlConfiguration::at_speed(6000.0, 2);
    let solution = IndividualAsvMinFlow
        .apply(&start, &mut train, &strategies)
        .unwrap();
    assert!(solution.success);
    let rates = &solution.configuration.recirculation_rates;
    assert!(rates[0] >= 100.0 && rates[0] - 100.0 < 1e-2);
    assert!(rates[1] >= 50.0 && rates[1] - 50.0 < 1e-2);
}

#[test]
fn individual_min_flow_stops_at_first_infeasible_loop() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![2000.0, 50.0]);
    let start = PressureControlConfiguration::at_speed(6000.0, 2);
    let solution = IndividualAsvMinFlow
        .apply(&start, &mut train, &strategies)
        .unwrap();
    assert!(!solution.success);
    assert_eq!(solution.configuration.recirculation_rates, vec![1000.0, 0.0]);
}

#[test]
fn common_min_flow_needs_one_loop() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![150.0]);
    let start = PressureControlConfiguration::at_speed(6000.0, 1);
    let solution = CommonAsvMinFlow.apply(&start, &mut train, &strategies).unwrap();
    assert!(solution.success);
    assert!((solution.configuration.recirculation_rates[0] - 150.0).abs() < 1e-2);

    let mut two_loops = LinearTrain::new(vec![150.0, 10.0]);
    let start = PressureControlConfiguration::at_speed(6000.0, 2);
    assert!(CommonAsvMinFlow.apply(&start, &mut two_loops, &strategies).is_err());
}

#[test]
fn policy_is_skipped_when_baseline_meets_target() {
    let strategies = SearchStrategies::default();
    let policy = CountingPolicy::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver = PressureControlSolver::new(&IndividualAsvMinFlow, &policy, &strategies, speeds());

    // baseline outlet is 27 + 0.01 * speed
    let outcome = solver.solve(target(90.0), &mut train).unwrap();
    assert!(outcome.solution.success);
    assert!((outcome.speed.configuration.speed - 6300.0).abs() < 1.0);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn policy_runs_when_minimum_speed_overshoots() {
    let strategies = SearchStrategies::default();
    let policy = CountingPolicy::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver = PressureControlSolver::new(&IndividualAsvMinFlow, &policy, &strategies, speeds());

    let outcome = solver.solve(target(60.0), &mut train).unwrap();
    assert!(outcome.speed.success);
    assert_eq!(outcome.speed.configuration.speed, 5000.0);
    assert_eq!(policy.calls.load(Ordering::SeqCst), 1);
    // the counting policy changes nothing, so the target stays missed
    assert!(!outcome.solution.success);
}

#[test]
fn individual_rate_shares_headroom() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver = PressureControlSolver::new(
        &IndividualAsvMinFlow,
        &IndividualAsvRate,
        &strategies,
        speeds(),
    );
    let outcome = solver.solve(target(60.0), &mut train).unwrap();
    assert!(outcome.solution.success);

    let configuration = &outcome.solution.configuration;
    let fraction = 17.0 / 37.0;
    assert!((configuration.recirculation_rates[0] - (100.0 + fraction * 900.0)).abs() < 0.5);
    assert!((configuration.recirculation_rates[1] - (50.0 + fraction * 950.0)).abs() < 0.5);
    assert!(target(60.0).is_met(outlet_pressure(&mut train, configuration)));
}

#[test]
fn individual_pressure_splits_ratio_evenly() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver = PressureControlSolver::new(
        &IndividualAsvMinFlow,
        &IndividualAsvPressure,
        &strategies,
        speeds(),
    );
    let outcome = solver.solve(target(60.0), &mut train).unwrap();
    assert!(outcome.solution.success);

    let configuration = &outcome.solution.configuration;
    let first_stage = train.evaluate_through_loop(configuration, 0).unwrap();
    assert!((first_stage.pressure_bara() - 30.0 * 2f64.sqrt()).abs() < 1e-2);
    assert!(target(60.0).is_met(outlet_pressure(&mut train, configuration)));
}

#[test]
fn common_asv_adds_recirculation() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![150.0]);
    let solver = PressureControlSolver::new(&CommonAsvMinFlow, &CommonAsv, &strategies, speeds());
    // one loop: 30 + 0.005 * speed - 0.02 * rate, 52 bar at minimum speed
    let outcome = solver.solve(target(40.0), &mut train).unwrap();
    assert!(outcome.solution.success);
    assert!((outcome.solution.configuration.recirculation_rates[0] - 750.0).abs() < 0.5);
}

#[test]
fn chokes_throttle_to_target() {
    let strategies = SearchStrategies::default();

    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver =
        PressureControlSolver::new(&IndividualAsvMinFlow, &UpstreamChoke, &strategies, speeds());
    let outcome = solver.solve(target(60.0), &mut train).unwrap();
    assert!(outcome.solution.success);
    assert!((outcome.solution.configuration.choke.upstream_pressure_drop - 17.0).abs() < 1e-2);

    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver =
        PressureControlSolver::new(&IndividualAsvMinFlow, &DownstreamChoke, &strategies, speeds());
    let outcome = solver.solve(target(60.0), &mut train).unwrap();
    assert!(outcome.solution.success);
    assert!((outcome.solution.configuration.choke.downstream_pressure_drop - 17.0).abs() < 1e-2);
}

#[test]
fn unreachable_target_is_a_failure_at_maximum_speed() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    let solver = PressureControlSolver::new(
        &IndividualAsvMinFlow,
        &IndividualAsvRate,
        &strategies,
        speeds(),
    );
    let outcome = solver.solve(target(200.0), &mut train).unwrap();
    assert!(!outcome.speed.success);
    assert!(!outcome.solution.success);
    assert_eq!(outcome.speed.configuration.speed, 10000.0);
    // minimum flow holds even though the target is missed
    assert!(outcome.minimum_flow_restored);
}

#[test]
fn stonewall_pushes_speed_up() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![100.0, 50.0]);
    train.stonewall_speed = 7000.0;
    let solver = PressureControlSolver::new(
        &IndividualAsvMinFlow,
        &IndividualAsvRate,
        &strategies,
        speeds(),
    );
    // below what 7000 rpm gives, so recirculation takes the surplus
    let outcome = solver.solve(target(80.0), &mut train).unwrap();
    assert!(outcome.solution.success);
    assert!(outcome.speed.configuration.speed >= 7000.0);
    assert!(outcome.speed.configuration.speed < 7001.0);
}

#[test]
fn no_capacity_anywhere_fails_softly() {
    let strategies = SearchStrategies::default();
    let mut train = LinearTrain::new(vec![5000.0, 50.0]);
    let solver = PressureControlSolver::new(
        &IndividualAsvMinFlow,
        &IndividualAsvRate,
        &strategies,
        speeds(),
    );
    let before = train.evaluations;
    let outcome = solver.solve(target(60.0), &mut train).unwrap();
    assert!(!outcome.solution.success);
    assert_eq!(outcome.solution.configuration.speed, 5000.0);
    assert!(!outcome.minimum_flow_restored);
    assert!(train.evaluations > before);
}

#[test]
fn min_flow_policies_reraise_stonewall_untouched() {
    let strategies = SearchStrategies::default();
    let policies: [(&dyn CapacityPolicy, usize); 2] =
        [(&CommonAsvMinFlow, 1), (&IndividualAsvMinFlow, 2)];
    for (policy, loops) in policies {
        let mut train = LinearTrain::new(vec![100.0; loops]);
        train.stonewall_speed = f64::MAX;
        let start = PressureControlConfiguration::at_speed(6000.0, loops);
        let err = policy.apply(&start, &mut train, &strategies).unwrap_err();
        assert!(err.is_rate_too_high(), "{}: {err}", policy.name());
        assert_eq!(train.evaluations, 1, "{}", policy.name());
    }
}

#[test]
fn individual_policies_reject_short_baseline() {
    let strategies = SearchStrategies::default();
    let short = PressureControlConfiguration::at_speed(9000.0, 0);
    let policies: [&dyn PressureControlPolicy; 2] = [&IndividualAsvPressure, &IndividualAsvRate];
    for policy in policies {
        let mut train = LinearTrain::new(vec![100.0, 50.0]);
        let err = policy
            .apply(&short, target(60.0), &mut train, &strategies)
            .unwrap_err();
        assert!(
            matches!(err, ProcessError::InvalidArg { .. }),
            "{}: {err}",
            policy.name()
        );
        assert_eq!(train.evaluations, 0);
    }
}

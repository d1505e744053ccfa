//! Centrifugal compressor stage driven by a shared shaft.

use crate::chart::CompressorChart;
use crate::convergence::{OutletConvergenceConfig, converge_outlet};
use crate::error::{ProcessError, ProcessResult};
use crate::state::ProcessState;
use crate::unit::ProcessUnit;
use ct_core::units::{Power, Temperature, bara, watt};
use ct_fluids::FluidStream;

/// Compressor stage: optional inlet conditioning, envelope check, then the
/// polytropic outlet iteration at the head and efficiency the chart gives for
/// the current shaft speed.
///
/// Conditioning ahead of the stage is applied in order: pressure drop
/// (isenthalpic), then cooling to a fixed inlet temperature.
#[derive(Debug, Clone)]
pub struct CompressorStage {
    name: String,
    chart: CompressorChart,
    inlet_temperature: Option<Temperature>,
    pressure_drop_ahead_of_stage: f64,
    convergence: OutletConvergenceConfig,
}

/// Stage operating point at one inlet and speed.
#[derive(Debug, Clone)]
pub struct OperatingPoint {
    /// Inlet after conditioning
    pub inlet: FluidStream,
    /// Actual volumetric rate at the conditioned inlet [Am³/h]
    pub actual_rate: f64,
    /// Polytropic head [J/kg]
    pub head: f64,
    pub efficiency: f64,
}

impl CompressorStage {
    pub fn new(name: impl Into<String>, chart: CompressorChart) -> Self {
        Self {
            name: name.into(),
            chart,
            inlet_temperature: None,
            pressure_drop_ahead_of_stage: 0.0,
            convergence: OutletConvergenceConfig::default(),
        }
    }

    /// Cool (or heat) the gas to `t` before it enters the stage.
    pub fn with_inlet_temperature(mut self, t: Temperature) -> Self {
        self.inlet_temperature = Some(t);
        self
    }

    /// Pressure drop [bar] ahead of the stage, e.g. a scrubber.
    pub fn with_pressure_drop_ahead_of_stage(mut self, delta_p_bara: f64) -> ProcessResult<Self> {
        if !delta_p_bara.is_finite() || delta_p_bara < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "pressure drop ahead of stage must be finite and non-negative",
            });
        }
        self.pressure_drop_ahead_of_stage = delta_p_bara;
        Ok(self)
    }

    pub fn with_convergence(mut self, config: OutletConvergenceConfig) -> Self {
        self.convergence = config;
        self
    }

    pub fn chart(&self) -> &CompressorChart {
        &self.chart
    }

    fn condition_inlet(&self, inlet: &FluidStream) -> ProcessResult<FluidStream> {
        let mut stream = inlet.clone();
        if self.pressure_drop_ahead_of_stage > 0.0 {
            let p = stream.pressure_bara() - self.pressure_drop_ahead_of_stage;
            if p <= 0.0 {
                return Err(ProcessError::NonPhysical {
                    what: "pressure drop ahead of stage exceeds inlet pressure",
                });
            }
            stream = stream.flash_to_pressure_and_enthalpy_change(bara(p), 0.0)?;
        }
        if let Some(t) = self.inlet_temperature {
            stream = stream.with_temperature(t)?;
        }
        Ok(stream)
    }

    /// Check the chart envelope at the current speed and look up head.
    pub fn operating_point(
        &self,
        inlet: &FluidStream,
        state: &ProcessState,
    ) -> ProcessResult<OperatingPoint> {
        let speed = state.speed()?;
        let conditioned = self.condition_inlet(inlet)?;
        let actual_rate = conditioned.actual_rate();

        let minimum_rate = self.chart.minimum_rate_at(speed)?;
        if actual_rate < minimum_rate {
            return Err(ProcessError::RateTooLow {
                unit: self.name.clone(),
                actual_rate,
                minimum_rate,
            });
        }
        let maximum_rate = self.chart.maximum_rate_at(speed)?;
        if actual_rate > maximum_rate {
            return Err(ProcessError::RateTooHigh {
                unit: self.name.clone(),
                actual_rate,
                maximum_rate,
            });
        }

        let (head, efficiency) = self.chart.head_and_efficiency(actual_rate, speed)?;
        Ok(OperatingPoint {
            inlet: conditioned,
            actual_rate,
            head,
            efficiency,
        })
    }
}

impl ProcessUnit for CompressorStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<FluidStream> {
        let point = self.operating_point(inlet, state)?;
        let result = converge_outlet(&point.inlet, point.head, point.efficiency, &self.convergence)?;
        if !result.converged {
            tracing::debug!(stage = %self.name, "using unconverged stage outlet");
        }
        Ok(result.outlet)
    }

    /// `mass_rate · (h_out - h_in)` at the conditioned inlet, i.e. `ṁ·H/η`.
    fn shaft_power(&self, inlet: &FluidStream, state: &ProcessState) -> ProcessResult<Power> {
        let point = self.operating_point(inlet, state)?;
        Ok(watt(
            point.inlet.mass_rate_kgps() * point.head / point.efficiency,
        ))
    }

    fn maximum_standard_rate(
        &self,
        inlet: &FluidStream,
        state: &ProcessState,
    ) -> ProcessResult<Option<f64>> {
        let speed = state.speed()?;
        let conditioned = self.condition_inlet(inlet)?;
        Ok(Some(self.chart.maximum_standard_rate(&conditioned, speed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartCurve;
    use ct_core::units::k;
    use ct_fluids::{Composition, VirialGasModel};
    use std::sync::Arc;

    fn inlet(rate: f64) -> FluidStream {
        FluidStream::create_stream_from_standard_rate(
            Arc::new(VirialGasModel::new()),
            Composition::dry_gas(),
            bara(30.0),
            k(300.0),
            rate,
        )
        .unwrap()
    }

    fn stage() -> CompressorStage {
        let chart = CompressorChart::new(vec![
            ChartCurve::new(
                8000.0,
                vec![800.0, 1200.0, 1600.0],
                vec![60_000.0, 52_000.0, 40_000.0],
                vec![0.74, 0.78, 0.72],
            )
            .unwrap(),
            ChartCurve::new(
                10000.0,
                vec![1000.0, 1500.0, 2000.0],
                vec![95_000.0, 82_000.0, 62_000.0],
                vec![0.74, 0.78, 0.72],
            )
            .unwrap(),
        ])
        .unwrap();
        CompressorStage::new("stage 1", chart)
    }

    fn state_at(speed: f64) -> ProcessState {
        let mut state = ProcessState::new(0, 0);
        state.set_speed(speed).unwrap();
        state
    }

    #[test]
    fn requires_speed() {
        let result = stage().propagate(&inlet(1.0e6), &ProcessState::new(0, 0));
        assert!(matches!(result, Err(ProcessError::SpeedNotSet)));
    }

    #[test]
    fn compresses_inside_envelope() {
        // about 1350 Am³/h at 30 bara / 300 K
        let stream = inlet(1.0e6);
        let outlet = stage().propagate(&stream, &state_at(9000.0)).unwrap();
        assert!(outlet.pressure_bara() > stream.pressure_bara());
        assert!((outlet.standard_rate() - 1.0e6).abs() < 1e-3);
    }

    #[test]
    fn higher_speed_gives_higher_pressure() {
        let stream = inlet(1.0e6);
        let low = stage().propagate(&stream, &state_at(8500.0)).unwrap();
        let high = stage().propagate(&stream, &state_at(9500.0)).unwrap();
        assert!(high.pressure_bara() > low.pressure_bara());
    }

    #[test]
    fn low_rate_raises_rate_too_low() {
        let result = stage().propagate(&inlet(3.0e5), &state_at(9000.0));
        assert!(result.unwrap_err().is_rate_too_low());
    }

    #[test]
    fn high_rate_raises_rate_too_high() {
        let result = stage().propagate(&inlet(3.0e6), &state_at(9000.0));
        assert!(result.unwrap_err().is_rate_too_high());
    }

    #[test]
    fn inlet_conditioning_changes_actual_rate() {
        let stream = inlet(1.0e6);
        let plain = stage().operating_point(&stream, &state_at(9000.0)).unwrap();
        let conditioned = stage()
            .with_pressure_drop_ahead_of_stage(2.0)
            .unwrap()
            .with_inlet_temperature(k(290.0))
            .operating_point(&stream, &state_at(9000.0))
            .unwrap();
        assert!((conditioned.inlet.pressure_bara() - 28.0).abs() < 1e-9);
        assert_eq!(conditioned.inlet.temperature().value, 290.0);
        assert!(conditioned.actual_rate != plain.actual_rate);
    }

    #[test]
    fn shaft_power_is_mass_rate_times_enthalpy_rise() {
        let stream = inlet(1.0e6);
        let state = state_at(9000.0);
        let s = stage();
        let outlet = s.propagate(&stream, &state).unwrap();
        let power = s.shaft_power(&stream, &state).unwrap().value;
        let expected = stream.mass_rate_kgps() * (outlet.enthalpy() - stream.enthalpy());
        assert!((power - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn stonewall_standard_rate_matches_actual_limit() {
        let stream = inlet(1.0e6);
        let state = state_at(9000.0);
        let max_std = stage()
            .maximum_standard_rate(&stream, &state)
            .unwrap()
            .unwrap();
        let at_limit = stream.with_standard_rate(max_std).unwrap();
        assert!((at_limit.actual_rate() - 1800.0).abs() < 1e-6);
    }
}

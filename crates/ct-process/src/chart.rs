//! Compressor performance charts.
//!
//! A chart is a set of constant-speed curves giving polytropic head and
//! efficiency against actual volumetric rate. Between curves the chart
//! interpolates linearly in speed on the normalised rate position
//!
//! ```text
//! s = (Q - Q_min(N)) / (Q_max(N) - Q_min(N))
//! ```
//!
//! so surge and stonewall lines are straight between neighbouring curves.
//! Charts are read-only once built.

use crate::error::{ProcessError, ProcessResult};
use ct_core::units::constants::SECONDS_PER_DAY;
use ct_core::{Boundary, lerp};
use ct_fluids::FluidStream;

/// One constant-speed curve. Rates [Am³/h], heads [J/kg], efficiencies in (0, 1].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartCurve {
    speed: f64,
    rates: Vec<f64>,
    heads: Vec<f64>,
    efficiencies: Vec<f64>,
}

impl ChartCurve {
    pub fn new(
        speed: f64,
        rates: Vec<f64>,
        heads: Vec<f64>,
        efficiencies: Vec<f64>,
    ) -> ProcessResult<Self> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "curve speed must be finite and non-negative",
            });
        }
        if rates.len() < 2 || rates.len() != heads.len() || rates.len() != efficiencies.len() {
            return Err(ProcessError::InvalidArg {
                what: "curve needs at least two points of equal length",
            });
        }
        if rates.iter().any(|r| !r.is_finite() || *r <= 0.0)
            || rates.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(ProcessError::InvalidArg {
                what: "curve rates must be positive and strictly increasing",
            });
        }
        if heads.iter().any(|h| !h.is_finite() || *h <= 0.0) {
            return Err(ProcessError::InvalidArg {
                what: "curve heads must be positive",
            });
        }
        if efficiencies
            .iter()
            .any(|e| !e.is_finite() || *e <= 0.0 || *e > 1.0)
        {
            return Err(ProcessError::InvalidArg {
                what: "curve efficiencies must be in (0, 1]",
            });
        }
        Ok(Self {
            speed,
            rates,
            heads,
            efficiencies,
        })
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Surge-side rate [Am³/h]
    pub fn minimum_rate(&self) -> f64 {
        self.rates[0]
    }

    /// Stonewall rate [Am³/h]
    pub fn maximum_rate(&self) -> f64 {
        self.rates[self.rates.len() - 1]
    }

    /// Head and efficiency at a normalised rate position in `[0, 1]`.
    fn at_position(&self, position: f64) -> (f64, f64) {
        let rate = lerp(self.minimum_rate(), self.maximum_rate(), position);
        let upper = self
            .rates
            .partition_point(|r| *r < rate)
            .clamp(1, self.rates.len() - 1);
        let lower = upper - 1;
        let t = (rate - self.rates[lower]) / (self.rates[upper] - self.rates[lower]);
        (
            lerp(self.heads[lower], self.heads[upper], t),
            lerp(self.efficiencies[lower], self.efficiencies[upper], t),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressorChart {
    curves: Vec<ChartCurve>,
}

impl CompressorChart {
    /// Build a chart from curves ordered by strictly increasing speed.
    pub fn new(curves: Vec<ChartCurve>) -> ProcessResult<Self> {
        if curves.is_empty() {
            return Err(ProcessError::InvalidArg {
                what: "chart needs at least one curve",
            });
        }
        if curves.windows(2).any(|w| w[1].speed <= w[0].speed) {
            return Err(ProcessError::InvalidArg {
                what: "chart curves must have strictly increasing speed",
            });
        }
        Ok(Self { curves })
    }

    /// Fixed-speed machine: the single curve applies at any shaft speed.
    pub fn single_speed(curve: ChartCurve) -> Self {
        Self {
            curves: vec![curve],
        }
    }

    pub fn curves(&self) -> &[ChartCurve] {
        &self.curves
    }

    pub fn is_single_speed(&self) -> bool {
        self.curves.len() == 1
    }

    pub fn minimum_speed(&self) -> f64 {
        self.curves[0].speed
    }

    pub fn maximum_speed(&self) -> f64 {
        self.curves[self.curves.len() - 1].speed
    }

    pub fn speed_boundary(&self) -> ProcessResult<Boundary> {
        Ok(Boundary::new(self.minimum_speed(), self.maximum_speed())?)
    }

    /// Bracketing curves and interpolation weight for a speed.
    fn bracket(&self, speed: f64) -> ProcessResult<(&ChartCurve, &ChartCurve, f64)> {
        if !speed.is_finite() {
            return Err(ProcessError::NonPhysical {
                what: "chart speed must be finite",
            });
        }
        let first = &self.curves[0];
        if self.curves.len() == 1 {
            return Ok((first, first, 0.0));
        }
        let span = self.maximum_speed() - self.minimum_speed();
        let slack = 1e-9 * span;
        if speed < self.minimum_speed() - slack || speed > self.maximum_speed() + slack {
            return Err(ProcessError::InvalidArg {
                what: "speed outside chart range",
            });
        }
        let upper = self
            .curves
            .partition_point(|c| c.speed < speed)
            .clamp(1, self.curves.len() - 1);
        let (lo, hi) = (&self.curves[upper - 1], &self.curves[upper]);
        let w = ((speed - lo.speed) / (hi.speed - lo.speed)).clamp(0.0, 1.0);
        Ok((lo, hi, w))
    }

    /// Surge-line rate at `speed` [Am³/h]
    pub fn minimum_rate_at(&self, speed: f64) -> ProcessResult<f64> {
        let (lo, hi, w) = self.bracket(speed)?;
        Ok(lerp(lo.minimum_rate(), hi.minimum_rate(), w))
    }

    /// Stonewall rate at `speed` [Am³/h]
    pub fn maximum_rate_at(&self, speed: f64) -> ProcessResult<f64> {
        let (lo, hi, w) = self.bracket(speed)?;
        Ok(lerp(lo.maximum_rate(), hi.maximum_rate(), w))
    }

    /// Smallest rate on the whole chart [Am³/h]
    pub fn minimum_rate(&self) -> f64 {
        self.curves
            .iter()
            .map(ChartCurve::minimum_rate)
            .fold(f64::INFINITY, f64::min)
    }

    /// Largest rate on the whole chart [Am³/h]
    pub fn maximum_rate(&self) -> f64 {
        self.curves
            .iter()
            .map(ChartCurve::maximum_rate)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Polytropic head [J/kg] and efficiency at an actual rate and speed.
    ///
    /// Rates outside the envelope are clamped onto it; the stage checks the
    /// envelope itself before asking for head.
    pub fn head_and_efficiency(&self, rate: f64, speed: f64) -> ProcessResult<(f64, f64)> {
        let (lo, hi, w) = self.bracket(speed)?;
        let q_min = lerp(lo.minimum_rate(), hi.minimum_rate(), w);
        let q_max = lerp(lo.maximum_rate(), hi.maximum_rate(), w);
        let position = ((rate - q_min) / (q_max - q_min)).clamp(0.0, 1.0);
        let (h_lo, e_lo) = lo.at_position(position);
        let (h_hi, e_hi) = hi.at_position(position);
        Ok((lerp(h_lo, h_hi, w), lerp(e_lo, e_hi, w)))
    }

    /// Stonewall expressed as standard rate [Sm³/day] for a given inlet.
    pub fn maximum_standard_rate(&self, inlet: &FluidStream, speed: f64) -> ProcessResult<f64> {
        let q_max = self.maximum_rate_at(speed)?;
        Ok(q_max * inlet.density() * (SECONDS_PER_DAY / 3600.0) / inlet.standard_density())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn curve(speed: f64, q_min: f64, q_max: f64, h_max: f64) -> ChartCurve {
        ChartCurve::new(
            speed,
            vec![q_min, 0.5 * (q_min + q_max), q_max],
            vec![h_max, 0.85 * h_max, 0.6 * h_max],
            vec![0.72, 0.78, 0.70],
        )
        .unwrap()
    }

    fn two_speed_chart() -> CompressorChart {
        CompressorChart::new(vec![
            curve(7000.0, 600.0, 1400.0, 60_000.0),
            curve(10000.0, 900.0, 2000.0, 120_000.0),
        ])
        .unwrap()
    }

    #[test]
    fn curve_validation() {
        assert!(ChartCurve::new(1.0, vec![1.0], vec![1.0], vec![0.5]).is_err());
        assert!(ChartCurve::new(1.0, vec![2.0, 1.0], vec![1.0, 1.0], vec![0.5, 0.5]).is_err());
        assert!(ChartCurve::new(1.0, vec![1.0, 2.0], vec![1.0, -1.0], vec![0.5, 0.5]).is_err());
        assert!(ChartCurve::new(1.0, vec![1.0, 2.0], vec![1.0, 1.0], vec![0.5, 1.5]).is_err());
    }

    #[test]
    fn chart_rejects_unordered_speeds() {
        let result = CompressorChart::new(vec![
            curve(10000.0, 900.0, 2000.0, 120_000.0),
            curve(7000.0, 600.0, 1400.0, 60_000.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn speed_limits() {
        let chart = two_speed_chart();
        assert_eq!(chart.minimum_speed(), 7000.0);
        assert_eq!(chart.maximum_speed(), 10000.0);
        let boundary = chart.speed_boundary().unwrap();
        assert_eq!((boundary.min(), boundary.max()), (7000.0, 10000.0));
    }

    #[test]
    fn rate_limits_interpolate_in_speed() {
        let chart = two_speed_chart();
        assert!((chart.minimum_rate_at(8500.0).unwrap() - 750.0).abs() < 1e-9);
        assert!((chart.maximum_rate_at(8500.0).unwrap() - 1700.0).abs() < 1e-9);
        assert_eq!(chart.minimum_rate(), 600.0);
        assert_eq!(chart.maximum_rate(), 2000.0);
    }

    #[test]
    fn head_on_curve_matches_curve_points() {
        let chart = two_speed_chart();
        let (h, e) = chart.head_and_efficiency(600.0, 7000.0).unwrap();
        assert!((h - 60_000.0).abs() < 1e-9);
        assert!((e - 0.72).abs() < 1e-12);
        let (h, _) = chart.head_and_efficiency(2000.0, 10000.0).unwrap();
        assert!((h - 72_000.0).abs() < 1e-9);
    }

    #[test]
    fn speed_outside_chart_is_rejected() {
        let chart = two_speed_chart();
        assert!(chart.head_and_efficiency(1000.0, 12000.0).is_err());
        assert!(chart.minimum_rate_at(5000.0).is_err());
    }

    #[test]
    fn single_speed_chart_ignores_shaft_speed() {
        let chart = CompressorChart::single_speed(curve(9000.0, 500.0, 1000.0, 80_000.0));
        assert!(chart.is_single_speed());
        assert_eq!(chart.minimum_rate_at(123.0).unwrap(), 500.0);
        let (h, _) = chart.head_and_efficiency(500.0, 5.0).unwrap();
        assert!((h - 80_000.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn head_rises_with_speed(position in 0.0f64..1.0, s1 in 7000.0f64..10000.0, s2 in 7000.0f64..10000.0) {
            let chart = two_speed_chart();
            let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
            let rate_at = |speed: f64| {
                let q_min = chart.minimum_rate_at(speed).unwrap();
                let q_max = chart.maximum_rate_at(speed).unwrap();
                q_min + position * (q_max - q_min)
            };
            let (h_lo, _) = chart.head_and_efficiency(rate_at(lo), lo).unwrap();
            let (h_hi, _) = chart.head_and_efficiency(rate_at(hi), hi).unwrap();
            prop_assert!(h_hi >= h_lo - 1e-6);
        }

        #[test]
        fn efficiency_stays_in_unit_interval(rate in 100.0f64..3000.0, speed in 7000.0f64..10000.0) {
            let chart = two_speed_chart();
            let (h, e) = chart.head_and_efficiency(rate, speed).unwrap();
            prop_assert!(h > 0.0);
            prop_assert!(e > 0.0 && e <= 1.0);
        }
    }
}

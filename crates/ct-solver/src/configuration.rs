//! Operating configurations and solver solutions.
//!
//! Configurations are small values; solvers build new ones rather than
//! mutating the one they were given.

/// Shaft speed [rpm]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedConfiguration {
    pub speed: f64,
}

/// Loop recirculation rate [Sm³/day]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecirculationConfiguration {
    pub recirculation_rate: f64,
}

/// Choke pressure drops [bar]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChokeConfiguration {
    pub upstream_pressure_drop: f64,
    pub downstream_pressure_drop: f64,
}

/// Everything a train needs to propagate: speed, one rate per loop, chokes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PressureControlConfiguration {
    pub speed: f64,
    pub recirculation_rates: Vec<f64>,
    pub choke: ChokeConfiguration,
}

impl PressureControlConfiguration {
    /// `speed` with every loop closed and chokes open.
    pub fn at_speed(speed: f64, loop_count: usize) -> Self {
        Self {
            speed,
            recirculation_rates: vec![0.0; loop_count],
            choke: ChokeConfiguration::default(),
        }
    }

    /// Same configuration with loop `index` set to `rate`.
    pub fn with_recirculation_rate(&self, index: usize, rate: f64) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.recirculation_rates.get_mut(index) {
            *slot = rate;
        }
        next
    }

    pub fn with_recirculation_rates(&self, rates: Vec<f64>) -> Self {
        Self {
            recirculation_rates: rates,
            ..self.clone()
        }
    }

    pub fn with_choke(&self, choke: ChokeConfiguration) -> Self {
        Self {
            choke,
            ..self.clone()
        }
    }
}

/// Solver result. `success = false` is a best-effort (boundary-clamped)
/// configuration, not an error; callers must check it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution<C> {
    pub success: bool,
    pub configuration: C,
}

impl<C> Solution<C> {
    pub fn new(success: bool, configuration: C) -> Self {
        Self {
            success,
            configuration,
        }
    }

    pub fn success(configuration: C) -> Self {
        Self::new(true, configuration)
    }

    pub fn failure(configuration: C) -> Self {
        Self::new(false, configuration)
    }

    pub fn map<D>(self, f: impl FnOnce(C) -> D) -> Solution<D> {
        Solution {
            success: self.success,
            configuration: f(self.configuration),
        }
    }
}

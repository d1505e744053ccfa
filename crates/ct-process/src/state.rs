//! Session state for one train: shaft speed, loop rates and choke settings.
//!
//! Units read `ProcessState` by shared reference while propagating. Only the
//! holder of `&mut ProcessState` (a solver session) changes it, and the type is
//! deliberately not `Clone`, so one state cannot drive two solves at once.

use crate::error::{ProcessError, ProcessResult};
use ct_core::{ChokeId, LoopId};

/// Rotational speed shared by every stage on one mechanical shaft [rpm].
#[derive(Debug, Default)]
pub struct Shaft {
    speed: Option<f64>,
}

impl Shaft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_speed(&mut self, speed: f64) -> ProcessResult<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "shaft speed must be finite and non-negative",
            });
        }
        self.speed = Some(speed);
        Ok(())
    }

    /// Current speed, or `SpeedNotSet` before the first `set_speed`.
    pub fn speed(&self) -> ProcessResult<f64> {
        self.speed.ok_or(ProcessError::SpeedNotSet)
    }

    pub fn is_set(&self) -> bool {
        self.speed.is_some()
    }
}

#[derive(Debug)]
pub struct ProcessState {
    shaft: Shaft,
    /// Standard rate added by each loop [Sm³/day], indexed by `LoopId`
    recirculation_rates: Vec<f64>,
    /// Pressure drop across each choke [bar], indexed by `ChokeId`
    choke_pressure_drops: Vec<f64>,
}

impl ProcessState {
    pub fn new(loop_count: usize, choke_count: usize) -> Self {
        Self {
            shaft: Shaft::new(),
            recirculation_rates: vec![0.0; loop_count],
            choke_pressure_drops: vec![0.0; choke_count],
        }
    }

    pub fn shaft(&self) -> &Shaft {
        &self.shaft
    }

    pub fn speed(&self) -> ProcessResult<f64> {
        self.shaft.speed()
    }

    pub fn set_speed(&mut self, speed: f64) -> ProcessResult<()> {
        self.shaft.set_speed(speed)
    }

    pub fn loop_count(&self) -> usize {
        self.recirculation_rates.len()
    }

    pub fn choke_count(&self) -> usize {
        self.choke_pressure_drops.len()
    }

    pub fn recirculation_rate(&self, id: LoopId) -> ProcessResult<f64> {
        self.recirculation_rates
            .get(id.slot())
            .copied()
            .ok_or(ProcessError::InvalidArg {
                what: "unknown recirculation loop",
            })
    }

    pub fn set_recirculation_rate(&mut self, id: LoopId, rate: f64) -> ProcessResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "recirculation rate must be finite and non-negative",
            });
        }
        let slot = self
            .recirculation_rates
            .get_mut(id.slot())
            .ok_or(ProcessError::InvalidArg {
                what: "unknown recirculation loop",
            })?;
        *slot = rate;
        Ok(())
    }

    /// Set every loop rate at once; `rates.len()` must equal `loop_count()`.
    pub fn set_recirculation_rates(&mut self, rates: &[f64]) -> ProcessResult<()> {
        if rates.len() != self.recirculation_rates.len() {
            return Err(ProcessError::InvalidArg {
                what: "recirculation rate count does not match loop count",
            });
        }
        for (index, &rate) in rates.iter().enumerate() {
            self.set_recirculation_rate(LoopId::from_index(index as u32), rate)?;
        }
        Ok(())
    }

    pub fn recirculation_rates(&self) -> &[f64] {
        &self.recirculation_rates
    }

    pub fn choke_pressure_drop(&self, id: ChokeId) -> ProcessResult<f64> {
        self.choke_pressure_drops
            .get(id.slot())
            .copied()
            .ok_or(ProcessError::InvalidArg {
                what: "unknown choke",
            })
    }

    pub fn set_choke_pressure_drop(&mut self, id: ChokeId, delta_p_bara: f64) -> ProcessResult<()> {
        if !delta_p_bara.is_finite() || delta_p_bara < 0.0 {
            return Err(ProcessError::InvalidArg {
                what: "choke pressure drop must be finite and non-negative",
            });
        }
        let slot = self
            .choke_pressure_drops
            .get_mut(id.slot())
            .ok_or(ProcessError::InvalidArg {
                what: "unknown choke",
            })?;
        *slot = delta_p_bara;
        Ok(())
    }
}

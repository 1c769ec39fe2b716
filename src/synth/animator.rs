//! Frequency animation driven one sample at a time.
//!
//! A ramp is a list of legs, each a signed number of whole Hz. The animator
//! walks the pitch through the legs in 1 Hz steps, one step every
//! `1 / rate` seconds. Leftover time is carried into the next call so ramp
//! timing doesn't depend on how the caller slices time.

use crate::error::EngineError;

/// Something that advances a frequency over time
pub trait FrequencyAnimation {
    /// Advance by `dt` seconds and return the new frequency
    fn next(&mut self, dt: f64, current_hz: f64) -> f64;

    /// Whether the animation has nothing left to do
    fn is_done(&self) -> bool;
}

/// Identity animation used while the engine holds its pitch
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldSteady;

impl FrequencyAnimation for HoldSteady {
    fn next(&mut self, _dt: f64, current_hz: f64) -> f64 {
        current_hz
    }

    fn is_done(&self) -> bool {
        false
    }
}

/// Progress through the legs of a started ramp
#[derive(Debug, Clone, Copy, PartialEq)]
struct Running {
    leg: usize,
    /// Signed Hz moved within the current leg
    progress: i32,
    /// Time not yet spent on a step (always < step interval after advancing)
    accum_s: f64,
    value_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lifecycle {
    /// Waiting for the first `next` call to capture the starting pitch
    Uninitialized,
    Running(Running),
    Done { value_hz: f64 },
}

enum Advance {
    Running(f64),
    Finished(f64),
}

impl Running {
    fn starting_at(value_hz: f64) -> Self {
        Self {
            leg: 0,
            progress: 0,
            accum_s: 0.0,
            value_hz,
        }
    }

    fn advance(&mut self, dt: f64, step_interval_s: f64, legs: &[i32]) -> Advance {
        self.accum_s += dt;

        while self.accum_s >= step_interval_s {
            self.accum_s -= step_interval_s;

            let goal = legs[self.leg];
            if goal != 0 {
                let unit = goal.signum();
                self.value_hz += f64::from(unit);
                self.progress += unit;
                if self.progress.abs() < goal.abs() {
                    continue;
                }
            }

            // Leg satisfied (zero legs are satisfied immediately)
            self.leg += 1;
            self.progress = 0;
            if self.leg >= legs.len() {
                return Advance::Finished(self.value_hz);
            }
        }

        Advance::Running(self.value_hz)
    }
}

/// Scripted multi-leg frequency ramp
#[derive(Debug, Clone)]
pub struct FrequencyAnimator {
    /// Seconds per 1 Hz step
    step_interval_s: f64,
    legs: Vec<i32>,
    lifecycle: Lifecycle,
}

impl FrequencyAnimator {
    /// Create a ramp moving at `rate_hz_per_s` through `legs`
    ///
    /// Fails if the rate is not a positive finite number or `legs` is empty.
    pub fn new(rate_hz_per_s: f64, legs: impl Into<Vec<i32>>) -> Result<Self, EngineError> {
        if !(rate_hz_per_s.is_finite() && rate_hz_per_s > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "ramp rate must be positive, got {} Hz/s",
                rate_hz_per_s
            )));
        }
        let legs = legs.into();
        if legs.is_empty() {
            return Err(EngineError::InvalidConfig(
                "ramp needs at least one leg".to_string(),
            ));
        }

        Ok(Self {
            step_interval_s: 1.0 / rate_hz_per_s,
            legs,
            lifecycle: Lifecycle::Uninitialized,
        })
    }

    /// Forget any progress; the next call to `next` starts the ramp over
    pub fn reset(&mut self) {
        self.lifecycle = Lifecycle::Uninitialized;
    }
}

impl FrequencyAnimation for FrequencyAnimator {
    fn next(&mut self, dt: f64, current_hz: f64) -> f64 {
        let advance = match self.lifecycle {
            Lifecycle::Uninitialized => {
                self.lifecycle = Lifecycle::Running(Running::starting_at(current_hz));
                return current_hz;
            }
            Lifecycle::Done { value_hz } => return value_hz,
            Lifecycle::Running(ref mut running) => {
                running.advance(dt, self.step_interval_s, &self.legs)
            }
        };

        match advance {
            Advance::Running(value_hz) => value_hz,
            Advance::Finished(value_hz) => {
                self.lifecycle = Lifecycle::Done { value_hz };
                value_hz
            }
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Done { .. })
    }
}

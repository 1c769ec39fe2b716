//! Per-sample synthesis engine.

use std::fmt;

use super::animator::{FrequencyAnimation, FrequencyAnimator, HoldSteady};
use super::waveform::square;
use crate::error::EngineError;
use crate::noise::{CoherentNoise, NoiseGenerator};
use crate::params::SynthParams;

/// Direction of a frequency ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    Up,
    Down,
}

/// What the engine is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RunState {
    #[default]
    Off = 0,
    Steady = 1,
    RampingUp = 2,
    RampingDown = 3,
}

impl RunState {
    /// Decode a value produced by `state as u8`
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RunState::Off),
            1 => Some(RunState::Steady),
            2 => Some(RunState::RampingUp),
            3 => Some(RunState::RampingDown),
            _ => None,
        }
    }
}

impl From<Ramp> for RunState {
    fn from(ramp: Ramp) -> Self {
        match ramp {
            Ramp::Up => RunState::RampingUp,
            Ramp::Down => RunState::RampingDown,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Off => "off",
            RunState::Steady => "steady",
            RunState::RampingUp => "up",
            RunState::RampingDown => "down",
        };
        f.write_str(name)
    }
}

/// Snapshot of the engine for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatus {
    pub state: RunState,
    pub frequency_hz: f64,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine state: {} Freq: {}", self.state, self.frequency_hz)
    }
}

/// Drone synthesizer: square tone plus coherent noise at an animated pitch
pub struct SynthEngine<N = NoiseGenerator> {
    params: SynthParams,
    noise: N,
    state: RunState,
    frequency_hz: f64,

    /// Frames rendered so far; the phase reference for the next block
    elapsed_frames: u64,

    steady: HoldSteady,
    ramp_up: FrequencyAnimator,
    ramp_down: FrequencyAnimator,

    /// Output block, reused while the requested size stays the same
    buffer: Vec<f32>,
}

impl SynthEngine<NoiseGenerator> {
    /// Create an engine with the stock fractal Perlin noise
    pub fn with_params(params: SynthParams) -> Result<Self, EngineError> {
        let noise = NoiseGenerator::new(&params.noise);
        Self::new(params, noise)
    }
}

impl<N: CoherentNoise> SynthEngine<N> {
    /// Create an engine in the `Off` state
    pub fn new(params: SynthParams, noise: N) -> Result<Self, EngineError> {
        params.validate().map_err(EngineError::InvalidConfig)?;

        let ramp_up = FrequencyAnimator::new(params.ramp_rate_hz_per_s, params.legs(Ramp::Up))?;
        let ramp_down =
            FrequencyAnimator::new(params.ramp_rate_hz_per_s, params.legs(Ramp::Down))?;

        Ok(Self {
            frequency_hz: params.start_frequency_hz,
            params,
            noise,
            state: RunState::Off,
            elapsed_frames: 0,
            steady: HoldSteady,
            ramp_up,
            ramp_down,
            buffer: Vec::new(),
        })
    }

    /// Switch on at the current pitch; no-op if already running
    pub fn start(&mut self) {
        if !self.is_active() {
            self.state = RunState::Steady;
        }
    }

    /// Switch off, abandoning any ramp in progress
    pub fn stop(&mut self) {
        if self.is_active() {
            self.state = RunState::Off;
        }
    }

    /// Rev up through the up-ramp legs
    pub fn ramp_up(&mut self) -> Result<(), EngineError> {
        self.ramp(Ramp::Up)
    }

    /// Rev down through the down-ramp legs
    pub fn ramp_down(&mut self) -> Result<(), EngineError> {
        self.ramp(Ramp::Down)
    }

    /// Begin ramping in `direction`
    ///
    /// Asking for the ramp already under way lets it continue; any other
    /// request starts that direction's ramp from the current pitch.
    pub fn ramp(&mut self, direction: Ramp) -> Result<(), EngineError> {
        if !self.is_active() {
            return Err(EngineError::EngineInactive);
        }

        let target = RunState::from(direction);
        if self.state != target {
            match direction {
                Ramp::Up => self.ramp_up.reset(),
                Ramp::Down => self.ramp_down.reset(),
            }
        }
        self.state = target;
        Ok(())
    }

    /// Whether the engine is producing sound
    pub fn is_active(&self) -> bool {
        self.state != RunState::Off
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Pitch the next sample will be rendered at (Hz)
    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Output sample rate (Hz)
    pub fn sample_rate_hz(&self) -> u32 {
        self.params.sample_rate_hz
    }

    /// Absolute time of the next sample to be generated (seconds)
    pub fn elapsed_time_s(&self) -> f64 {
        self.elapsed_frames as f64 / f64::from(self.params.sample_rate_hz)
    }

    /// Snapshot of state and pitch
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            frequency_hz: self.frequency_hz,
        }
    }

    /// Render the next `frame_count` mono samples
    ///
    /// Callers are expected to output silence instead of calling this while
    /// the engine is off; if called anyway the pitch is simply held.
    pub fn generate(&mut self, frame_count: usize) -> &[f32] {
        if self.buffer.len() != frame_count {
            self.buffer.resize(frame_count, 0.0);
        }

        let sample_rate = f64::from(self.params.sample_rate_hz);
        let sample_period = self.params.sample_period_s();
        let tone_mix = self.params.tone_mix;
        let noise_mix = self.params.noise_mix;
        let gain = self.params.output_gain;

        let Self {
            noise,
            state,
            frequency_hz,
            elapsed_frames,
            steady,
            ramp_up,
            ramp_down,
            buffer,
            ..
        } = self;

        for (i, slot) in buffer.iter_mut().enumerate() {
            let t = (*elapsed_frames + i as u64) as f64 / sample_rate;
            let f = *frequency_hz;

            let sample = (square(t, f) * tone_mix + noise.sample(t * f) * noise_mix) * gain;
            *slot = sample as f32;

            let animator: &mut dyn FrequencyAnimation = match *state {
                RunState::RampingUp => &mut *ramp_up,
                RunState::RampingDown => &mut *ramp_down,
                RunState::Off | RunState::Steady => &mut *steady,
            };
            *frequency_hz = animator.next(sample_period, f);

            // Ramp finished: hold the new pitch from the next sample on
            if animator.is_done() {
                *state = RunState::Steady;
            }
        }

        *elapsed_frames += frame_count as u64;
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Noise source that contributes nothing, leaving only the square tone
    struct Silence;

    impl CoherentNoise for Silence {
        fn sample(&self, _x: f64) -> f64 {
            0.0
        }
    }

    fn engine() -> SynthEngine {
        SynthEngine::with_params(SynthParams::default()).unwrap()
    }

    /// Generate `seconds` of audio in device-sized blocks
    fn run_for<N: CoherentNoise>(engine: &mut SynthEngine<N>, seconds: f64) {
        let frames = (seconds * f64::from(engine.sample_rate_hz())) as usize;
        let mut done = 0;
        while done < frames {
            let n = (frames - done).min(512);
            engine.generate(n);
            done += n;
        }
    }

    #[test]
    fn test_initial_state() {
        let engine = engine();
        assert_eq!(engine.state(), RunState::Off);
        assert!(!engine.is_active());
        assert_eq!(engine.frequency_hz(), 220.0);
        assert_eq!(engine.elapsed_time_s(), 0.0);
    }

    #[test]
    fn test_start_stop_transitions() {
        let mut engine = engine();
        engine.start();
        assert_eq!(engine.state(), RunState::Steady);
        engine.start();
        assert_eq!(engine.state(), RunState::Steady);
        engine.stop();
        assert_eq!(engine.state(), RunState::Off);
        engine.stop();
        assert_eq!(engine.state(), RunState::Off);
    }

    #[test]
    fn test_ramp_requires_active_engine() {
        let mut engine = engine();
        assert_eq!(engine.ramp_up(), Err(EngineError::EngineInactive));
        assert_eq!(engine.ramp_down(), Err(EngineError::EngineInactive));
        assert_eq!(engine.state(), RunState::Off);
    }

    #[test]
    fn test_generate_returns_requested_length() {
        let mut engine = engine();
        engine.start();
        for &n in &[0, 1, 64, 512, 441, 2048] {
            assert_eq!(engine.generate(n).len(), n);
        }
    }

    #[test]
    fn test_buffer_reused_for_same_size() {
        let mut engine = engine();
        engine.start();
        let first = engine.generate(256).as_ptr();
        let second = engine.generate(256).as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_steady_output_is_phase_continuous() {
        let mut split = engine();
        let mut whole = engine();
        split.start();
        whole.start();

        let mut pieces = split.generate(300).to_vec();
        pieces.extend_from_slice(split.generate(300));
        let joined = whole.generate(600).to_vec();

        assert_eq!(pieces, joined);
        assert_eq!(split.elapsed_time_s(), whole.elapsed_time_s());
    }

    #[test]
    fn test_sample_mix() {
        // Four samples per second at 1 Hz puts sample 1 on the tone's peak
        let params = SynthParams {
            sample_rate_hz: 4,
            start_frequency_hz: 1.0,
            ..SynthParams::default()
        };
        let mut engine = SynthEngine::new(params, Silence).unwrap();
        engine.start();
        let out = engine.generate(4).to_vec();

        let peak = square(0.25, 1.0) * 0.02 * 1.1;
        assert_eq!(out[0], 0.0);
        assert!((f64::from(out[1]) - peak).abs() < 1e-6);
        assert!((f64::from(out[3]) + peak).abs() < 1e-6);
    }

    #[test]
    fn test_ramp_up_scenario() {
        let mut engine = engine();
        engine.start();
        engine.ramp_up().unwrap();
        assert_eq!(engine.state(), RunState::RampingUp);

        // 175 Hz of travel at 250 Hz/s takes 0.7 s
        run_for(&mut engine, 0.5);
        assert_eq!(engine.state(), RunState::RampingUp);

        run_for(&mut engine, 0.3);
        assert_eq!(engine.state(), RunState::Steady);
        assert_eq!(engine.frequency_hz(), 345.0);

        // And it stays there
        run_for(&mut engine, 0.5);
        assert_eq!(engine.frequency_hz(), 345.0);
    }

    #[test]
    fn test_ramp_down_scenario() {
        let mut engine = engine();
        engine.start();
        engine.ramp_down().unwrap();
        run_for(&mut engine, 0.8);
        assert_eq!(engine.state(), RunState::Steady);
        assert_eq!(engine.frequency_hz(), 95.0);
    }

    #[test]
    fn test_ramp_overshoots_before_settling() {
        let mut engine = engine();
        engine.start();
        engine.ramp_up().unwrap();

        // 64 frames is shorter than one 1 Hz step, so every pitch shows up
        let mut trace = Vec::new();
        while engine.state() == RunState::RampingUp {
            engine.generate(64);
            trace.push(engine.frequency_hz());
        }

        let flare = trace.iter().position(|&f| f == 320.0).unwrap();
        let settle = flare + trace[flare..].iter().position(|&f| f == 295.0).unwrap();
        assert_eq!(trace[..settle].iter().cloned().fold(0.0, f64::max), 320.0);
        assert_eq!(trace.last(), Some(&345.0));
    }

    #[test]
    fn test_stop_mid_ramp_keeps_reached_frequency() {
        let mut engine = engine();
        engine.start();
        engine.ramp_up().unwrap();
        run_for(&mut engine, 0.2);

        let reached = engine.frequency_hz();
        assert!(reached > 220.0);

        engine.stop();
        assert_eq!(engine.state(), RunState::Off);
        engine.start();
        assert_eq!(engine.state(), RunState::Steady);
        assert_eq!(engine.frequency_hz(), reached);

        run_for(&mut engine, 0.5);
        assert_eq!(engine.frequency_hz(), reached);

        // A new ramp starts over from the reached pitch
        engine.ramp_up().unwrap();
        run_for(&mut engine, 0.8);
        assert_eq!(engine.frequency_hz(), reached + 125.0);
    }

    #[test]
    fn test_repeated_ramp_request_continues() {
        let mut engine = engine();
        engine.start();
        engine.ramp_up().unwrap();
        run_for(&mut engine, 0.2);
        engine.ramp_up().unwrap();
        run_for(&mut engine, 0.6);
        assert_eq!(engine.state(), RunState::Steady);
        assert_eq!(engine.frequency_hz(), 345.0);
    }

    #[test]
    fn test_switching_direction_restarts_from_current_pitch() {
        let mut engine = engine();
        engine.start();
        engine.ramp_up().unwrap();
        run_for(&mut engine, 0.1);
        let switched_at = engine.frequency_hz();

        engine.ramp_down().unwrap();
        assert_eq!(engine.state(), RunState::RampingDown);
        run_for(&mut engine, 0.8);
        assert_eq!(engine.state(), RunState::Steady);
        assert_eq!(engine.frequency_hz(), switched_at - 125.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = SynthParams {
            up_legs_hz: Vec::new(),
            ..SynthParams::default()
        };
        assert!(matches!(
            SynthEngine::with_params(params),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_status_display() {
        let status = EngineStatus {
            state: RunState::Steady,
            frequency_hz: 220.0,
        };
        assert_eq!(status.to_string(), "Engine state: steady Freq: 220");
    }

    #[test]
    fn test_run_state_round_trips_through_u8() {
        for state in [
            RunState::Off,
            RunState::Steady,
            RunState::RampingUp,
            RunState::RampingDown,
        ] {
            assert_eq!(RunState::from_u8(state as u8), Some(state));
        }
        assert_eq!(RunState::from_u8(9), None);
    }
}

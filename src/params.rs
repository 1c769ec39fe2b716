//! Parameter definitions with physical units and documented semantics.
//!
//! Every tunable constant of the drone lives here with:
//! - Physical units (Hz, seconds, Hz/s)
//! - Documented ranges and meanings
//! - A `Default` that reproduces the stock engine sound

use crate::synth::Ramp;

/// Fixed defaults for the stock engine sound
pub mod synth_constants {
    /// Output sample rate (Hz)
    pub const SAMPLE_RATE_HZ: u32 = 44_100;

    /// Idle pitch of the engine (Hz)
    pub const START_FREQUENCY_HZ: f64 = 220.0;

    /// Speed of every ramp leg (Hz per second)
    pub const RAMP_RATE_HZ_PER_S: f64 = 250.0;

    /// Rev up: flare past the target, settle back, then climb the rest
    pub const UP_LEGS_HZ: [i32; 3] = [100, -25, 50];

    /// Rev down: mirror image of the up ramp
    pub const DOWN_LEGS_HZ: [i32; 3] = [-100, 25, -50];

    /// Commands buffered between the console and the audio thread
    pub const COMMAND_QUEUE_CAPACITY: usize = 64;

    /// Longest offline render accepted (seconds)
    pub const MAX_RENDER_DURATION_S: f64 = 3600.0;
}

use synth_constants::*;

/// Coherent noise configuration (fractal Brownian motion over Perlin noise)
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseParams {
    /// Perlin permutation seed
    pub seed: u32,

    /// Number of layered octaves
    /// stock value: 5
    pub octaves: usize,

    /// Amplitude multiplier between successive octaves
    /// stock value: 0.95 (keeps the upper octaves loud, giving the rasp)
    pub persistence: f64,

    /// Frequency multiplier between successive octaves
    /// stock value: 2.0
    pub lacunarity: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 5,
            persistence: 0.95,
            lacunarity: 2.0,
        }
    }
}

/// Synthesis parameters for the drone engine
#[derive(Debug, Clone, PartialEq)]
pub struct SynthParams {
    /// Output sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Frequency the engine idles at before any ramp (Hz)
    pub start_frequency_hz: f64,

    /// How fast ramps move the pitch (Hz per second, one 1 Hz step per 1/rate s)
    pub ramp_rate_hz_per_s: f64,

    /// Legs of the rev-up ramp (signed Hz deltas, applied in order)
    pub up_legs_hz: Vec<i32>,

    /// Legs of the rev-down ramp (signed Hz deltas, applied in order)
    pub down_legs_hz: Vec<i32>,

    /// Weight of the odd-harmonic square tone in the mix
    pub tone_mix: f64,

    /// Weight of the coherent noise in the mix
    pub noise_mix: f64,

    /// Gain applied after mixing (no clipping, output may exceed ±1)
    pub output_gain: f64,

    pub noise: NoiseParams,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            sample_rate_hz: SAMPLE_RATE_HZ,
            start_frequency_hz: START_FREQUENCY_HZ,
            ramp_rate_hz_per_s: RAMP_RATE_HZ_PER_S,
            up_legs_hz: UP_LEGS_HZ.to_vec(),
            down_legs_hz: DOWN_LEGS_HZ.to_vec(),
            tone_mix: 0.02,
            noise_mix: 0.98,
            output_gain: 1.1,
            noise: NoiseParams::default(),
        }
    }
}

impl SynthParams {
    /// Legs for the given ramp direction
    pub fn legs(&self, ramp: Ramp) -> &[i32] {
        match ramp {
            Ramp::Up => &self.up_legs_hz,
            Ramp::Down => &self.down_legs_hz,
        }
    }

    /// Duration of one sample (seconds)
    pub fn sample_period_s(&self) -> f64 {
        1.0 / f64::from(self.sample_rate_hz)
    }

    /// Validate configuration (positive rates, non-empty ramps, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if !(self.start_frequency_hz.is_finite() && self.start_frequency_hz > 0.0) {
            return Err(format!(
                "Start frequency must be a positive number of Hz, got {}",
                self.start_frequency_hz
            ));
        }
        if !(self.ramp_rate_hz_per_s.is_finite() && self.ramp_rate_hz_per_s > 0.0) {
            return Err(format!(
                "Ramp rate must be a positive number of Hz/s, got {}",
                self.ramp_rate_hz_per_s
            ));
        }
        if self.up_legs_hz.is_empty() || self.down_legs_hz.is_empty() {
            return Err("Ramps need at least one leg".to_string());
        }
        if self.noise.octaves == 0 {
            return Err("Noise needs at least one octave".to_string());
        }
        Ok(())
    }
}

/// Audio device output configuration
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Frames per device callback, `None` lets the backend choose
    pub block_size_frames: Option<u32>,
}

/// Offline render configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Length of the rendered file (seconds)
    pub duration_s: f64,

    /// Frames generated per engine call, mimicking a device callback
    pub block_size_frames: usize,

    /// WAV file to write
    pub output_path: String,
}

impl RenderConfig {
    pub fn new(duration_s: f64, output_path: impl Into<String>) -> Self {
        Self {
            duration_s,
            block_size_frames: 512,
            output_path: output_path.into(),
        }
    }

    /// Validate configuration (bounded duration, non-empty blocks)
    pub fn validate(&self) -> Result<(), String> {
        if !(self.duration_s.is_finite()
            && (0.0..=MAX_RENDER_DURATION_S).contains(&self.duration_s))
        {
            return Err(format!(
                "Render duration must be between 0 and {} s, got {}",
                MAX_RENDER_DURATION_S, self.duration_s
            ));
        }
        if self.block_size_frames == 0 {
            return Err("Render block size must be > 0".to_string());
        }
        Ok(())
    }

    /// Total number of frames to render at the given sample rate
    pub fn total_frames(&self, sample_rate_hz: u32) -> usize {
        (self.duration_s * f64::from(sample_rate_hz)).round().max(0.0) as usize
    }
}

//! Coherent noise for the engine rumble.
//!
//! The synth only needs a smooth 1D signal in [-1, 1]; anything that
//! implements [`CoherentNoise`] can be plugged into the engine.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::params::NoiseParams;

/// Smooth, band-limited pseudo-random function of one variable
pub trait CoherentNoise {
    /// Sample the noise at `x`
    ///
    /// Returns value in range [-1, 1]
    fn sample(&self, x: f64) -> f64;
}

/// Row of the 2D Perlin lattice used as the 1D noise line
const SLICE_Y: f64 = 0.5;

/// Fractal Perlin noise generator
pub struct NoiseGenerator {
    fbm: Fbm<Perlin>,
}

impl NoiseGenerator {
    /// Create new noise generator from parameters
    pub fn new(params: &NoiseParams) -> Self {
        let fbm = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves)
            .set_frequency(1.0)
            .set_persistence(params.persistence)
            .set_lacunarity(params.lacunarity);
        Self { fbm }
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new(&NoiseParams::default())
    }
}

impl CoherentNoise for NoiseGenerator {
    fn sample(&self, x: f64) -> f64 {
        // fBm with high persistence can overshoot the unit range slightly
        self.fbm.get([x, SLICE_Y]).clamp(-1.0, 1.0)
    }
}

//! Offline rendering of a scripted engine session to a WAV file.
//!
//! A script is a whitespace-separated list of cues such as
//! `start@0 step@0.5 down@2 stop@3.5`. Each cue fires at the first block
//! boundary at or after its time, exactly as a console command would land
//! between device callbacks.

use std::path::Path;

use anyhow::Context;

use crate::error::EngineError;
use crate::noise::CoherentNoise;
use crate::params::RenderConfig;
use crate::synth::{Command, Ramp, SynthEngine};

/// A command scheduled at an absolute time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub at_s: f64,
    pub command: Command,
}

impl Cue {
    /// Parse a single `<command>@<seconds>` token
    pub fn parse(token: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidCue(token.to_string());

        let (name, time) = token.split_once('@').ok_or_else(invalid)?;
        let command = match name {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "step" | "up" => Command::Ramp(Ramp::Up),
            "down" => Command::Ramp(Ramp::Down),
            _ => return Err(invalid()),
        };
        let at_s: f64 = time.parse().map_err(|_| invalid())?;
        if !(at_s.is_finite() && at_s >= 0.0) {
            return Err(invalid());
        }

        Ok(Self { at_s, command })
    }
}

/// Parse a whole script, sorted by time (ties keep script order)
pub fn parse_script(script: &str) -> Result<Vec<Cue>, EngineError> {
    let mut cues = script
        .split_whitespace()
        .map(Cue::parse)
        .collect::<Result<Vec<_>, _>>()?;
    cues.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));
    Ok(cues)
}

/// Run the engine through `cues` and collect the mono output
///
/// The engine is driven in blocks of `config.block_size_frames`, silence
/// is emitted while it is off, and ramp cues on a stopped engine are skipped
/// with a warning. Fails before rendering anything if `config` is invalid.
pub fn render<N: CoherentNoise>(
    engine: &mut SynthEngine<N>,
    cues: &[Cue],
    config: &RenderConfig,
) -> Result<Vec<f32>, EngineError> {
    config.validate().map_err(EngineError::InvalidConfig)?;

    let sample_rate = engine.sample_rate_hz();
    let total_frames = config.total_frames(sample_rate);
    let block = config.block_size_frames;

    let mut samples = Vec::with_capacity(total_frames);
    let mut pending = cues.iter().peekable();

    while samples.len() < total_frames {
        let now_s = samples.len() as f64 / f64::from(sample_rate);
        while let Some(cue) = pending.next_if(|cue| cue.at_s <= now_s) {
            if let Err(e) = engine.apply(cue.command) {
                log::warn!("Skipping {:?} at {:.3}s: {}", cue.command, cue.at_s, e);
            }
        }

        let frames = (total_frames - samples.len()).min(block);
        if engine.is_active() {
            samples.extend_from_slice(engine.generate(frames));
        } else {
            samples.resize(samples.len() + frames, 0.0);
        }
    }

    Ok(samples)
}

/// Write mono 32-bit float samples to a WAV file
pub fn write_wav(
    path: impl AsRef<Path>,
    sample_rate_hz: u32,
    samples: &[f32],
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV writer at {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

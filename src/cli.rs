//! Command-line argument parsing.

use clap::{Parser, Subcommand};

use crate::params::{synth_constants, OutputConfig, RenderConfig, SynthParams};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "enginedrone")]
#[command(about = "Real-time engine drone synthesizer", long_about = None)]
pub struct Args {
    /// Output sample rate
    #[arg(long, value_name = "HZ", default_value_t = synth_constants::SAMPLE_RATE_HZ)]
    pub sample_rate: u32,

    /// Idle pitch of the engine
    #[arg(long, value_name = "HZ", default_value_t = synth_constants::START_FREQUENCY_HZ)]
    pub start_frequency: f64,

    /// Speed of rev ramps
    #[arg(long, value_name = "HZ_PER_S", default_value_t = synth_constants::RAMP_RATE_HZ_PER_S)]
    pub ramp_rate: f64,

    /// Perlin noise seed
    #[arg(long, value_name = "SEED", default_value_t = 0)]
    pub seed: u32,

    /// Frames per audio block (device callback size, or render block size)
    #[arg(long, value_name = "FRAMES")]
    pub block_size: Option<u32>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Mode {
    /// Play through the default audio device with an interactive prompt (default)
    Play,

    /// Render a scripted session to a WAV file
    Render {
        /// Timed commands, e.g. "start@0 step@0.5 down@2"
        #[arg(long, value_name = "CUES")]
        script: String,

        /// Length of the rendered file
        #[arg(long, value_name = "SECONDS", default_value_t = 5.0)]
        duration: f64,

        /// Output WAV path
        #[arg(long, value_name = "PATH", default_value = "enginedrone.wav")]
        output: String,
    },
}

impl Args {
    /// Selected mode, interactive playback when none was given
    pub fn mode(&self) -> Mode {
        self.mode.clone().unwrap_or(Mode::Play)
    }

    /// Synthesis parameters with command-line overrides applied
    pub fn synth_params(&self) -> SynthParams {
        let mut params = SynthParams {
            sample_rate_hz: self.sample_rate,
            start_frequency_hz: self.start_frequency,
            ramp_rate_hz_per_s: self.ramp_rate,
            ..SynthParams::default()
        };
        params.noise.seed = self.seed;
        params
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            block_size_frames: self.block_size,
        }
    }

    /// Render configuration if render mode is selected
    pub fn render_config(&self) -> Option<RenderConfig> {
        match &self.mode {
            Some(Mode::Render {
                duration, output, ..
            }) => {
                let mut config = RenderConfig::new(*duration, output.clone());
                if let Some(block) = self.block_size {
                    config.block_size_frames = block as usize;
                }
                Some(config)
            }
            _ => None,
        }
    }
}

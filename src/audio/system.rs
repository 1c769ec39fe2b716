//! Audio output stream driving the synth engine.

use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};

use crate::noise::CoherentNoise;
use crate::params::OutputConfig;
use crate::synth::EngineDriver;

/// Audio system owning the output stream
pub struct AudioSystem {
    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    sample_rate_hz: u32,
    channels: u16,
}

impl AudioSystem {
    /// Open the default output device and start rendering from `driver`
    ///
    /// The driver moves onto the device's callback thread; control it
    /// through the matching `EngineController`.
    pub fn new<N>(mut driver: EngineDriver<N>, output: &OutputConfig) -> anyhow::Result<Self>
    where
        N: CoherentNoise + Send + 'static,
    {
        let host = cpal::default_host();
        log::info!("cpal host: {}", host.id().name());

        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device found"))?;

        let default_config = device
            .default_output_config()
            .context("Failed to get audio config")?;

        let sample_rate_hz = driver.engine().sample_rate_hz();
        let config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: SampleRate(sample_rate_hz),
            buffer_size: output
                .block_size_frames
                .map_or(BufferSize::Default, BufferSize::Fixed),
        };

        log::info!(
            "Audio: {} @ {}Hz, {} channel(s), buffer {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            config.channels,
            config.buffer_size
        );

        let channels = usize::from(config.channels);
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    driver.process(data, channels);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .context("Failed to build audio stream")?;

        stream.play().context("Failed to start audio stream")?;

        Ok(Self {
            _stream: stream,
            sample_rate_hz,
            channels: config.channels,
        })
    }

    /// Rate the stream was opened at (Hz)
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Interleaved channels per device frame
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

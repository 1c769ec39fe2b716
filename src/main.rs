//! Enginedrone - an engine that idles, revs up and revs down on command.
//!
//! A steady drone of square tone and coherent noise whose pitch flares and
//! settles through scripted ramps, played live or rendered to a WAV file.

use std::io;
use std::thread;

use anyhow::Context;
use clap::Parser;

use enginedrone::audio::AudioSystem;
use enginedrone::cli::{Args, Mode};
use enginedrone::console::{forward_lines, Console, InputEvent};
use enginedrone::params::{synth_constants::COMMAND_QUEUE_CAPACITY, OutputConfig, SynthParams};
use enginedrone::render::{parse_script, render, write_wav};
use enginedrone::synth::{control_channel, SynthEngine};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = args.synth_params();

    match args.mode() {
        Mode::Play => play(params, args.output_config()),
        Mode::Render { script, .. } => {
            let config = args
                .render_config()
                .context("render mode without render configuration")?;
            let cues = parse_script(&script)?;

            let mut engine = SynthEngine::with_params(params)?;
            let samples = render(&mut engine, &cues, &config)?;
            write_wav(&config.output_path, engine.sample_rate_hz(), &samples)?;

            log::info!(
                "Rendered {:.2}s ({} samples) to {}",
                config.duration_s,
                samples.len(),
                config.output_path
            );
            Ok(())
        }
    }
}

/// Play live through the default output device until the user quits
fn play(params: SynthParams, output: OutputConfig) -> anyhow::Result<()> {
    println!("Enginedrone - engine drone synthesizer");
    println!("Initializing audio...\n");

    let engine = SynthEngine::with_params(params)?;
    let (controller, driver) = control_channel(engine, COMMAND_QUEUE_CAPACITY);
    let audio = AudioSystem::new(driver, &output)?;

    println!(
        "\nEnginedrone is running at {}Hz on {} channel(s)!",
        audio.sample_rate_hz(),
        audio.channels()
    );
    println!("Type 'help' for commands, 'quit' to exit\n");

    // Typed lines and Ctrl-C both reach the console as events
    let (events_tx, events) = crossbeam_channel::unbounded();
    let interrupt = events_tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(InputEvent::Interrupt);
    })
    .context("Failed to install Ctrl-C handler")?;
    thread::spawn(move || forward_lines(io::stdin().lock(), &events_tx));

    let mut console = Console::new(controller);
    console.run_events(&events, io::stdout())?;

    // Dropping the system stops the stream
    drop(audio);
    log::info!("Audio stream closed");
    Ok(())
}

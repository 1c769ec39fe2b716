//! Enginedrone library - Real-time engine drone synthesizer

pub mod audio;
pub mod cli;
pub mod console;
pub mod error;
pub mod noise;
pub mod params;
pub mod render;
pub mod synth;

//! Drone synthesis: frequency animation, tone generation and the engine state machine.
//!
//! The engine renders a square tone buried in coherent noise. Its pitch holds
//! steady until a ramp is requested, then walks through the ramp's legs one
//! Hz at a time before settling on the new pitch.

mod animator;
mod control;
mod engine;
mod waveform;

// Re-export public types
pub use animator::{FrequencyAnimation, FrequencyAnimator, HoldSteady};
pub use control::{control_channel, Command, EngineController, EngineDriver};
pub use engine::{EngineStatus, Ramp, RunState, SynthEngine};
pub use waveform::square;

//! Real-time audio output.
//!
//! Opens the default cpal output device and hands each callback buffer to
//! the engine driver. Silence is produced while the engine is off.

mod system;

// Re-export public types
pub use system::AudioSystem;

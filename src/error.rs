//! Error types shared by the engine, its control path and the offline renderer.

/// Errors raised by engine construction and control operations.
///
/// Nothing in here is produced from inside the audio callback; sample
/// generation itself is infallible.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A ramp was requested while the engine is off.
    #[error("engine is off, start it before ramping")]
    EngineInactive,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A render script entry could not be parsed.
    #[error("invalid cue '{0}' (expected <command>@<seconds>, e.g. step@0.5)")]
    InvalidCue(String),

    /// The audio thread has not drained earlier commands yet.
    #[error("command queue is full, audio thread is not keeping up")]
    CommandQueueFull,

    #[error("audio engine has shut down")]
    Disconnected,
}

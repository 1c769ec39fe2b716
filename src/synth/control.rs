//! Control path between the console thread and the audio thread.
//!
//! The audio thread owns the [`SynthEngine`] outright. Other threads hold an
//! [`EngineController`] that queues [`Command`]s; the audio thread applies
//! everything queued at the start of each block, so a command always lands
//! between two samples. Status flows back through a small sequence lock.

use std::hint;
use std::sync::atomic::{fence, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::engine::{EngineStatus, Ramp, RunState, SynthEngine};
use crate::error::EngineError;
use crate::noise::CoherentNoise;

/// Requests applied by the audio thread at a block boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Ramp(Ramp),
}

impl<N: CoherentNoise> SynthEngine<N> {
    /// Apply a control command
    pub fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Ramp(direction) => self.ramp(direction)?,
        }
        Ok(())
    }
}

/// Status published by the audio thread
///
/// The audio thread is the only writer. It bumps `seq` to an odd value,
/// stores state and frequency, then bumps it back to even; readers retry
/// until they see the same even `seq` on both sides of their loads, so a
/// status never mixes two blocks. The frequency keeps its full `f64` bits.
#[derive(Debug)]
struct SharedStatus {
    seq: AtomicU64,
    state: AtomicU8,
    frequency_bits: AtomicU64,
    /// Commands applied so far
    applied: AtomicU64,
}

impl SharedStatus {
    fn new(status: EngineStatus) -> Self {
        Self {
            seq: AtomicU64::new(0),
            state: AtomicU8::new(status.state as u8),
            frequency_bits: AtomicU64::new(status.frequency_hz.to_bits()),
            applied: AtomicU64::new(0),
        }
    }

    fn store(&self, status: EngineStatus) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.state.store(status.state as u8, Ordering::Relaxed);
        self.frequency_bits
            .store(status.frequency_hz.to_bits(), Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    fn load(&self) -> EngineStatus {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before % 2 == 0 {
                let state = self.state.load(Ordering::Relaxed);
                let bits = self.frequency_bits.load(Ordering::Relaxed);
                fence(Ordering::Acquire);

                if self.seq.load(Ordering::Relaxed) == before {
                    return EngineStatus {
                        state: RunState::from_u8(state).unwrap_or_default(),
                        frequency_hz: f64::from_bits(bits),
                    };
                }
            }
            hint::spin_loop();
        }
    }
}

/// Split an engine into a control handle and the audio-thread driver
pub fn control_channel<N: CoherentNoise>(
    engine: SynthEngine<N>,
    capacity: usize,
) -> (EngineController, EngineDriver<N>) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
    let shared = Arc::new(SharedStatus::new(engine.status()));

    let controller = EngineController {
        sender,
        shared: Arc::clone(&shared),
        active: engine.is_active(),
        sent: 0,
    };
    let driver = EngineDriver {
        engine,
        receiver,
        shared,
    };
    (controller, driver)
}

/// Control-side handle to an engine running on another thread
///
/// Only the controller switches the engine on and off (the engine itself
/// just falls back from a ramp to steady), so it can reject ramps on a
/// stopped engine without asking the audio thread.
pub struct EngineController {
    sender: Sender<Command>,
    shared: Arc<SharedStatus>,
    active: bool,
    sent: u64,
}

impl EngineController {
    /// Queue a start; no-op if already running
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.active {
            return Ok(());
        }
        self.send(Command::Start)?;
        self.active = true;
        Ok(())
    }

    /// Queue a stop; no-op if already off
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if !self.active {
            return Ok(());
        }
        self.send(Command::Stop)?;
        self.active = false;
        Ok(())
    }

    /// Queue a rev up, failing with `EngineInactive` while off
    pub fn ramp_up(&mut self) -> Result<(), EngineError> {
        self.ramp(Ramp::Up)
    }

    /// Queue a rev down, failing with `EngineInactive` while off
    pub fn ramp_down(&mut self) -> Result<(), EngineError> {
        self.ramp(Ramp::Down)
    }

    /// Queue a ramp in `direction`
    pub fn ramp(&mut self, direction: Ramp) -> Result<(), EngineError> {
        if !self.active {
            return Err(EngineError::EngineInactive);
        }
        self.send(Command::Ramp(direction))
    }

    /// Whether the engine is on, counting commands not yet applied
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Status as of the last block the audio thread rendered
    pub fn status(&self) -> EngineStatus {
        self.shared.load()
    }

    /// Whether every command sent so far has been applied
    pub fn is_synced(&self) -> bool {
        self.shared.applied.load(Ordering::Acquire) >= self.sent
    }

    /// Wait up to `timeout` for the audio thread to apply queued commands
    pub fn wait_applied(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_synced() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    fn send(&mut self, command: Command) -> Result<(), EngineError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::CommandQueueFull,
            TrySendError::Disconnected(_) => EngineError::Disconnected,
        })?;
        self.sent += 1;
        log::debug!("queued {:?}", command);
        Ok(())
    }
}

/// Audio-thread side: drains commands and renders blocks
pub struct EngineDriver<N> {
    engine: SynthEngine<N>,
    receiver: Receiver<Command>,
    shared: Arc<SharedStatus>,
}

impl<N: CoherentNoise> EngineDriver<N> {
    /// The engine as of the last applied command
    pub fn engine(&self) -> &SynthEngine<N> {
        &self.engine
    }

    /// Apply every queued command, returning how many were applied
    pub fn apply_pending(&mut self) -> u64 {
        let mut applied = 0;
        while let Ok(command) = self.receiver.try_recv() {
            // Ramps on a stopped engine were already rejected by the controller
            let _ = self.engine.apply(command);
            applied += 1;
        }
        applied
    }

    /// Fill an interleaved device buffer
    ///
    /// Pending commands take effect first. A stopped engine produces silence
    /// without advancing; otherwise each mono sample is copied to every channel.
    pub fn process(&mut self, out: &mut [f32], channels: usize) {
        let applied = self.apply_pending();
        let channels = channels.max(1);
        let frames = out.len() / channels;

        if self.engine.is_active() {
            let samples = self.engine.generate(frames);
            for (frame, &sample) in out.chunks_exact_mut(channels).zip(samples) {
                frame.fill(sample);
            }
            // Trailing partial frame, if the device handed us one
            out[frames * channels..].fill(0.0);
        } else {
            out.fill(0.0);
        }

        self.publish(applied);
    }

    fn publish(&self, applied: u64) {
        self.shared.store(self.engine.status());
        if applied > 0 {
            self.shared.applied.fetch_add(applied, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SynthParams;
    use std::sync::atomic::AtomicBool;

    fn pair(capacity: usize) -> (EngineController, EngineDriver<crate::noise::NoiseGenerator>) {
        let engine = SynthEngine::with_params(SynthParams::default()).unwrap();
        control_channel(engine, capacity)
    }

    #[test]
    fn test_commands_apply_at_next_block() {
        let (mut controller, mut driver) = pair(8);
        controller.start().unwrap();
        assert!(controller.is_active());
        assert!(!controller.is_synced());
        assert_eq!(driver.engine().state(), RunState::Off);

        let mut out = vec![0.0; 256];
        driver.process(&mut out, 1);
        assert_eq!(driver.engine().state(), RunState::Steady);
        assert!(controller.is_synced());
        assert!(controller.wait_applied(Duration::ZERO));
        assert_eq!(controller.status().state, RunState::Steady);
        assert_eq!(controller.status().frequency_hz, 220.0);
    }

    #[test]
    fn test_ramp_rejected_while_off() {
        let (mut controller, mut driver) = pair(8);
        assert_eq!(controller.ramp_up(), Err(EngineError::EngineInactive));
        assert_eq!(controller.ramp_down(), Err(EngineError::EngineInactive));
        assert_eq!(driver.apply_pending(), 0);
        assert_eq!(driver.engine().state(), RunState::Off);
    }

    #[test]
    fn test_queued_commands_apply_in_order() {
        let (mut controller, mut driver) = pair(8);
        controller.start().unwrap();
        controller.ramp_up().unwrap();
        controller.ramp_down().unwrap();
        assert_eq!(driver.apply_pending(), 3);
        assert_eq!(driver.engine().state(), RunState::RampingDown);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (mut controller, mut driver) = pair(8);
        controller.start().unwrap();
        controller.start().unwrap();
        controller.stop().unwrap();
        controller.stop().unwrap();
        assert!(!controller.is_active());
        assert_eq!(driver.apply_pending(), 2);
        assert_eq!(driver.engine().state(), RunState::Off);
    }

    #[test]
    fn test_silence_while_off() {
        let (_controller, mut driver) = pair(8);
        let mut out = vec![1.0; 128];
        driver.process(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(driver.engine().elapsed_time_s(), 0.0);
    }

    #[test]
    fn test_mono_copied_to_all_channels() {
        let (mut controller, mut driver) = pair(8);
        controller.start().unwrap();
        let mut out = vec![0.0; 2 * 100 + 1];
        driver.process(&mut out, 2);

        for frame in out[..200].chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(out[200], 0.0);
        assert!(out.iter().any(|&s| s != 0.0));
        assert_eq!(driver.engine().elapsed_time_s(), 100.0 / 44_100.0);
    }

    #[test]
    fn test_full_queue_reports_error() {
        let (mut controller, _driver) = pair(1);
        controller.start().unwrap();
        assert_eq!(controller.stop(), Err(EngineError::CommandQueueFull));
        // Still considered running since the stop never got through
        assert!(controller.is_active());
    }

    #[test]
    fn test_disconnected_driver() {
        let (mut controller, driver) = pair(4);
        drop(driver);
        assert_eq!(controller.start(), Err(EngineError::Disconnected));
        assert!(!controller.is_active());
    }

    #[test]
    fn test_status_keeps_full_precision() {
        let params = SynthParams {
            start_frequency_hz: 220.1,
            ..SynthParams::default()
        };
        let engine = SynthEngine::with_params(params).unwrap();
        let (mut controller, mut driver) = control_channel(engine, 8);
        assert_eq!(controller.status().frequency_hz, 220.1);

        controller.start().unwrap();
        let mut block = [0.0f32; 32];
        driver.process(&mut block, 1);
        let status = controller.status();
        assert_eq!(status.state, RunState::Steady);
        assert_eq!(status.frequency_hz, 220.1);
        assert_eq!(status.to_string(), "Engine state: steady Freq: 220.1");
    }

    #[test]
    fn test_commands_cross_to_running_audio_thread() {
        // Slow ramp so it is still under way whenever the status is read
        let params = SynthParams {
            ramp_rate_hz_per_s: 1.0,
            ..SynthParams::default()
        };
        let engine = SynthEngine::with_params(params).unwrap();
        let (mut controller, mut driver) = control_channel(engine, 8);
        let running = Arc::new(AtomicBool::new(true));

        let audio = {
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut block = vec![0.0; 256];
                while running.load(Ordering::Relaxed) {
                    driver.process(&mut block, 1);
                    thread::sleep(Duration::from_millis(1));
                }
                driver
            })
        };

        let timeout = Duration::from_millis(500);

        controller.start().unwrap();
        assert!(controller.wait_applied(timeout));
        assert_eq!(controller.status().state, RunState::Steady);

        controller.ramp_up().unwrap();
        assert!(controller.wait_applied(timeout));
        let status = controller.status();
        assert_eq!(status.state, RunState::RampingUp);
        assert!(status.frequency_hz >= 220.0);

        controller.stop().unwrap();
        assert!(controller.wait_applied(timeout));
        assert_eq!(controller.status().state, RunState::Off);

        running.store(false, Ordering::Relaxed);
        let driver = audio.join().unwrap();
        assert_eq!(driver.engine().state(), RunState::Off);
        // Stopped mid-ramp, so the pitch never went below where it started
        assert!(driver.engine().frequency_hz() >= 220.0);
    }
}

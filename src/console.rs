//! Interactive command prompt for driving the engine.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::error::EngineError;
use crate::synth::EngineController;

/// How long to wait for the audio thread before printing status
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_millis(100);

/// A line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    /// Ramp up
    Step,
    /// Ramp down
    Down,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl ConsoleCommand {
    /// Map a typed line to a command, blank lines show status
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "start" => ConsoleCommand::Start,
            "stop" => ConsoleCommand::Stop,
            "step" => ConsoleCommand::Step,
            "down" => ConsoleCommand::Down,
            "status" | "" => ConsoleCommand::Status,
            "help" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => ConsoleCommand::Unknown(other.to_string()),
        }
    }
}

/// Input arriving at the prompt from another thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C
    Interrupt,
    /// End of input
    Closed,
}

/// Forward lines from `input` until it ends, then send `Closed`
///
/// Stops early if the console has gone away.
pub fn forward_lines<R: BufRead>(input: R, events: &Sender<InputEvent>) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                if events.send(InputEvent::Line(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                log::warn!("Failed to read input: {}", e);
                break;
            }
        }
    }
    let _ = events.send(InputEvent::Closed);
}

const HELP: &str = "\
Commands:
  start   switch the engine on
  stop    switch the engine off
  step    rev up
  down    rev down
  status  show engine state
  quit    exit";

/// Read-eval-print loop over an engine controller
pub struct Console {
    controller: EngineController,
    sync_timeout: Duration,
}

impl Console {
    /// Console with the default wait for the audio thread
    pub fn new(controller: EngineController) -> Self {
        Self {
            controller,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }

    /// Set how long to wait for commands to reach the audio thread
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// The engine handle the console drives
    pub fn controller(&self) -> &EngineController {
        &self.controller
    }

    /// Run until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: W) -> io::Result<()> {
        let mut line = String::new();
        self.run_with(out, || {
            line.clear();
            Ok(match input.read_line(&mut line)? {
                0 => InputEvent::Closed,
                _ => InputEvent::Line(line.clone()),
            })
        })
    }

    /// Run until `quit`, end of input or an interrupt arrives on `events`
    pub fn run_events<W: Write>(
        &mut self,
        events: &Receiver<InputEvent>,
        out: W,
    ) -> io::Result<()> {
        self.run_with(out, || Ok(events.recv().unwrap_or(InputEvent::Closed)))
    }

    fn run_with<W, F>(&mut self, mut out: W, mut next_event: F) -> io::Result<()>
    where
        W: Write,
        F: FnMut() -> io::Result<InputEvent>,
    {
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let command = match next_event()? {
                InputEvent::Line(line) => ConsoleCommand::parse(&line),
                InputEvent::Interrupt | InputEvent::Closed => {
                    // Move off the prompt line
                    writeln!(out)?;
                    ConsoleCommand::Quit
                }
            };

            if !self.execute(&command, &mut out)? {
                return Ok(());
            }
        }
    }

    /// Execute one command, returning false once the console should exit
    pub fn execute<W: Write>(
        &mut self,
        command: &ConsoleCommand,
        out: &mut W,
    ) -> io::Result<bool> {
        let result = match command {
            ConsoleCommand::Start => {
                writeln!(out, "Starting engine...")?;
                self.controller.start()
            }
            ConsoleCommand::Stop => {
                writeln!(out, "Stopping engine...")?;
                self.controller.stop()
            }
            ConsoleCommand::Step => {
                writeln!(out, "Stepping up...")?;
                self.controller.ramp_up()
            }
            ConsoleCommand::Down => {
                writeln!(out, "Stepping down...")?;
                self.controller.ramp_down()
            }
            ConsoleCommand::Status => Ok(()),
            ConsoleCommand::Help => {
                writeln!(out, "{}", HELP)?;
                Ok(())
            }
            ConsoleCommand::Quit => {
                writeln!(out, "Quitting...")?;
                return Ok(false);
            }
            ConsoleCommand::Unknown(text) => {
                writeln!(out, "Unknown command '{}', try 'help'", text)?;
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(EngineError::EngineInactive) => {
                writeln!(out, "Engine is off, start it first")?;
            }
            Err(e) => {
                log::warn!("Command failed: {}", e);
                writeln!(out, "Command failed: {}", e)?;
            }
        }

        if !self.controller.wait_applied(self.sync_timeout) {
            log::debug!("audio thread has not applied queued commands yet");
        }
        writeln!(out, "{}", self.controller.status())?;
        Ok(true)
    }
}

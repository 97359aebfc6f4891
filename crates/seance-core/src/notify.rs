//! Audio cue on entry into an awaiting phase.
//!
//! The trigger fires on the transition edge only: staying in the same
//! awaiting phase, or rehydrating into one from a snapshot, does not
//! replay the cue.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use thiserror::Error;

use crate::storage::NotificationsConfig;
use crate::timer::Phase;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to play cue: {0}")]
    Io(#[from] std::io::Error),

    #[error("sound command exited with {0}")]
    CommandFailed(std::process::ExitStatus),

    #[error("sound command is empty")]
    EmptyCommand,
}

/// Which awaiting phase was just entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    BreakDue,
    StudyDue,
}

impl Cue {
    fn for_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::AwaitingBreak => Some(Cue::BreakDue),
            Phase::AwaitingStudy => Some(Cue::StudyDue),
            _ => None,
        }
    }
}

pub trait Notifier: Send {
    fn notify(&self, cue: Cue) -> Result<(), NotifyError>;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn notify(&self, _cue: Cue) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// Runs an external player, e.g. `paplay /usr/share/sounds/complete.oga`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Split a whitespace-separated command line.
    ///
    /// # Errors
    /// Returns `EmptyCommand` if the line holds no program.
    pub fn parse(command_line: &str) -> Result<Self, NotifyError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(NotifyError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Notifier for CommandNotifier {
    /// Spawns the player and returns without waiting for it; the child is
    /// reaped on a detached thread.
    fn notify(&self, _cue: Cue) -> Result<(), NotifyError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let program = self.program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                let err = NotifyError::CommandFailed(status);
                tracing::warn!(%program, error = %err, "sound command failed");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(%program, error = %e, "failed to wait for sound command"),
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _cue: Cue) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier selected by the user's notification settings.
///
/// An unusable `sound_command` falls back to the terminal bell.
pub fn from_config(cfg: &NotificationsConfig) -> Box<dyn Notifier> {
    if !cfg.enabled {
        return Box::new(SilentNotifier);
    }
    match cfg.sound_command.as_deref().map(CommandNotifier::parse) {
        Some(Ok(cmd)) => Box::new(cmd),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "ignoring sound_command");
            Box::new(BellNotifier)
        }
        None => Box::new(BellNotifier),
    }
}

/// Edge detector in front of a [`Notifier`].
pub struct NotificationTrigger {
    notifier: Box<dyn Notifier>,
    last_phase: Phase,
}

impl NotificationTrigger {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            notifier,
            last_phase: Phase::Idle,
        }
    }

    /// Record `phase` as already observed without firing.
    pub fn prime(&mut self, phase: Phase) {
        self.last_phase = phase;
    }

    /// Observe the current phase. Returns the cue when one was attempted.
    /// Playback failures are logged and swallowed.
    pub fn observe(&mut self, phase: Phase) -> Option<Cue> {
        let previous = std::mem::replace(&mut self.last_phase, phase);
        if previous == phase {
            return None;
        }
        let cue = Cue::for_phase(phase)?;
        if let Err(e) = self.notifier.notify(cue) {
            tracing::warn!(error = %e, ?cue, "notification cue failed");
        }
        Some(cue)
    }
}

impl std::fmt::Debug for NotificationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationTrigger")
            .field("last_phase", &self.last_phase)
            .finish_non_exhaustive()
    }
}

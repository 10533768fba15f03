//! Process spawning with captured I/O and a wall-clock deadline
//!
//! [`ProcessRunner`] is the seam between the orchestrator and whatever actually
//! starts programs. [`LocalProcessRunner`] spawns host processes directly; a
//! container or VM runtime can implement the same trait without the rest of
//! the pipeline changing.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub use crate::process::command::ProcessCommand;
pub use crate::process::local::{DEFAULT_DRAIN_GRACE, LocalProcessRunner};

mod command;
mod local;

/// Runs exactly one command to completion or deadline
///
/// Implementations must be stateless and reentrant: many requests call
/// `run` concurrently on the same runner.
#[async_trait]
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    /// Run the command and report what happened
    ///
    /// Never fails: a process that cannot be started is reported through
    /// [`ProcessOutcome::spawn_error`].
    async fn run(&self, command: &ProcessCommand) -> ProcessOutcome;
}

/// Everything captured from one process run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,

    /// Terminating signal, if the process was killed by one
    pub signal: Option<i32>,

    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,

    /// Wall time from spawn until the process exited or was killed
    pub wall_time: Duration,

    /// The deadline expired and the process group was killed
    pub timed_out: bool,

    /// Why the process could not be started (or waited on)
    pub spawn_error: Option<String>,

    /// At least one stream exceeded the output cap and was cut short
    pub output_truncated: bool,
}

impl ProcessOutcome {
    /// Outcome for a process that never started
    pub fn spawn_failure(error: impl Into<String>, wall_time: Duration) -> Self {
        Self {
            spawn_error: Some(error.into()),
            wall_time,
            ..Default::default()
        }
    }

    /// Whether the process started, finished in time, and exited with code 0
    pub fn is_success(&self) -> bool {
        self.spawn_error.is_none() && !self.timed_out && self.exit_code == Some(0)
    }

    /// Coarse classification of how the process ended
    pub fn termination(&self) -> Termination {
        match (self.exit_code, self.signal) {
            (_, Some(signal)) => Termination::Signaled(signal),
            (Some(code), None) => Termination::Exited(code),
            (None, None) => Termination::Unknown,
        }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// How a program stopped running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Normal exit with the given code
    Exited(i32),

    /// Killed by the given signal number
    Signaled(i32),

    /// Description supplied by a remote judge (e.g. "SIGSEGV")
    Reported(String),

    Unknown,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit code {code}"),
            Termination::Signaled(signal) => match signal_name(*signal) {
                Some(name) => write!(f, "killed by signal {signal} ({name})"),
                None => write!(f, "killed by signal {signal}"),
            },
            Termination::Reported(description) => f.write_str(description),
            Termination::Unknown => f.write_str("unknown termination"),
        }
    }
}

/// Conventional name of a POSIX signal
pub fn signal_name(signal: i32) -> Option<&'static str> {
    let name = match signal {
        libc::SIGHUP => "SIGHUP",
        libc::SIGINT => "SIGINT",
        libc::SIGQUIT => "SIGQUIT",
        libc::SIGILL => "SIGILL",
        libc::SIGTRAP => "SIGTRAP",
        libc::SIGABRT => "SIGABRT",
        libc::SIGBUS => "SIGBUS",
        libc::SIGFPE => "SIGFPE",
        libc::SIGKILL => "SIGKILL",
        libc::SIGUSR1 => "SIGUSR1",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGUSR2 => "SIGUSR2",
        libc::SIGPIPE => "SIGPIPE",
        libc::SIGALRM => "SIGALRM",
        libc::SIGTERM => "SIGTERM",
        libc::SIGXCPU => "SIGXCPU",
        libc::SIGXFSZ => "SIGXFSZ",
        libc::SIGSYS => "SIGSYS",
        _ => return None,
    };
    Some(name)
}

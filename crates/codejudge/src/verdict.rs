//! Verdicts and the caller-facing result shape
//!
//! Every way a submission can end is a [`Verdict`]. Formatting a verdict into
//! an [`ExecutionResult`] is pure and total.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::process::Termination;
use crate::types::ExecutionResult;

/// Output reported when a successful program printed nothing
pub const NO_OUTPUT_PLACEHOLDER: &str = "(no output)";

/// Message for every engine-side failure; host details stay in the logs
pub const SYSTEM_ERROR_MESSAGE: &str = "internal error while executing submission";

/// Classified outcome of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Program exited 0 before its deadline
    Success { stdout: String },

    /// Malformed request, rejected before any work
    ValidationError { reason: String },

    /// Language id not in the registry
    UnsupportedLanguage { language: String },

    /// Compiler rejected the program, ran out of time, or could not start
    CompileError { diagnostics: String },

    /// Program exited non-zero or was killed
    RuntimeError {
        stderr: String,
        termination: Termination,
    },

    /// Program was killed at its deadline
    TimeLimitExceeded { limit: Duration },

    /// Engine or environment fault
    SystemError,
}

/// Stable name of a verdict, used as the error message prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VerdictKind {
    Success,
    ValidationError,
    UnsupportedLanguage,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    SystemError,
}

impl VerdictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VerdictKind::Success => "Success",
            VerdictKind::ValidationError => "ValidationError",
            VerdictKind::UnsupportedLanguage => "UnsupportedLanguage",
            VerdictKind::CompileError => "CompileError",
            VerdictKind::RuntimeError => "RuntimeError",
            VerdictKind::TimeLimitExceeded => "TimeLimitExceeded",
            VerdictKind::SystemError => "SystemError",
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Verdict {
    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Success { .. } => VerdictKind::Success,
            Verdict::ValidationError { .. } => VerdictKind::ValidationError,
            Verdict::UnsupportedLanguage { .. } => VerdictKind::UnsupportedLanguage,
            Verdict::CompileError { .. } => VerdictKind::CompileError,
            Verdict::RuntimeError { .. } => VerdictKind::RuntimeError,
            Verdict::TimeLimitExceeded { .. } => VerdictKind::TimeLimitExceeded,
            Verdict::SystemError => VerdictKind::SystemError,
        }
    }

    /// The caller sent something unusable (HTTP 400 territory)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Verdict::ValidationError { .. } | Verdict::UnsupportedLanguage { .. }
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success { .. })
    }

    /// Human-readable error text, prefixed with the verdict kind
    ///
    /// Returns `None` for [`Verdict::Success`].
    pub fn error_message(&self) -> Option<String> {
        let kind = self.kind();
        let message = match self {
            Verdict::Success { .. } => return None,
            Verdict::ValidationError { reason } => format!("{kind}: {reason}"),
            Verdict::UnsupportedLanguage { language } => {
                format!("{kind}: language '{language}' is not supported")
            }
            Verdict::CompileError { diagnostics } => {
                format!("{kind}: Compilation failed:\n{diagnostics}")
            }
            Verdict::RuntimeError {
                stderr,
                termination,
            } => format!("{kind} ({termination}):\n{stderr}"),
            Verdict::TimeLimitExceeded { limit } => format!(
                "{kind}: Time limit exceeded ({} seconds)",
                limit.as_secs_f64()
            ),
            Verdict::SystemError => format!("{kind}: {SYSTEM_ERROR_MESSAGE}"),
        };
        Some(message)
    }
}

/// A verdict together with the execute-stage wall time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,

    /// Zero when no execute stage ran
    pub execution_time: Duration,
}

impl Judgement {
    pub fn new(verdict: Verdict, execution_time: Duration) -> Self {
        Self {
            verdict,
            execution_time,
        }
    }

    /// A verdict reached before anything was executed
    pub fn early(verdict: Verdict) -> Self {
        Self::new(verdict, Duration::ZERO)
    }

    /// Map to the caller-facing result
    pub fn to_result(&self) -> ExecutionResult {
        let ms = u64::try_from(self.execution_time.as_millis()).unwrap_or(u64::MAX);
        match &self.verdict {
            Verdict::Success { stdout } if stdout.is_empty() => {
                ExecutionResult::success(NO_OUTPUT_PLACEHOLDER, ms)
            }
            Verdict::Success { stdout } => ExecutionResult::success(stdout.clone(), ms),
            verdict => ExecutionResult::failure(verdict.error_message().unwrap_or_default(), ms),
        }
    }
}

impl From<Judgement> for ExecutionResult {
    fn from(judgement: Judgement) -> Self {
        judgement.to_result()
    }
}

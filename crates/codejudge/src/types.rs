use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Wall clock time limit in seconds
    #[serde(default)]
    pub wall_time_limit: Option<f64>,

    /// Maximum captured size of each output stream in kilobytes
    #[serde(default)]
    pub max_output: Option<u64>,
}

impl ResourceLimits {
    /// 1 megabyte in kilobytes
    pub const MB: u64 = 1024;

    /// Create resource limits with every field unset
    pub fn unset() -> Self {
        Self {
            wall_time_limit: None,
            max_output: None,
        }
    }

    /// Set the wall clock time limit in seconds
    pub fn with_wall_time_limit(mut self, seconds: f64) -> Self {
        self.wall_time_limit = Some(seconds);
        self
    }

    /// Set the maximum output size in kilobytes
    pub fn with_max_output(mut self, kb: u64) -> Self {
        self.max_output = Some(kb);
        self
    }

    /// Apply overrides from another ResourceLimits, preferring values from `overrides`
    ///
    /// Returns a new ResourceLimits with values from `overrides` taking precedence
    /// over values from `self` when both are present.
    pub fn with_overrides(&self, overrides: &ResourceLimits) -> ResourceLimits {
        ResourceLimits {
            wall_time_limit: overrides.wall_time_limit.or(self.wall_time_limit),
            max_output: overrides.max_output.or(self.max_output),
        }
    }

    /// Whether `secs` is a usable wall time limit: positive and representable as a `Duration`
    pub fn is_valid_wall_time(secs: f64) -> bool {
        secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()
    }

    /// The wall time limit as a deadline, if one is set and representable
    pub fn deadline(&self) -> Option<Duration> {
        self.wall_time_limit
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// The output cap in bytes, if one is set
    pub fn max_output_bytes(&self) -> Option<usize> {
        self.max_output
            .map(|kb| usize::try_from(kb.saturating_mul(1024)).unwrap_or(usize::MAX))
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            wall_time_limit: Some(5.0),
            max_output: Some(65536), // 64 MB
        }
    }
}

/// A submission handed to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Program source text
    #[serde(default)]
    pub code: String,

    /// Registered language identifier (e.g. "python")
    #[serde(default)]
    pub language: String,

    /// Data fed to the program's stdin
    #[serde(default)]
    pub input: String,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            input: String::new(),
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }
}

/// Caller-facing result of an execution
///
/// Exactly one of `output` and `error` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall time of the execute stage in milliseconds
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            execution_time_ms,
        }
    }

    pub fn failure(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            execution_time_ms,
        }
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn with_overrides_identity(
            wall_time in proptest::option::of(0.0f64..1000.0),
            output in proptest::option::of(0u64..1_000_000),
        ) {
            let base = ResourceLimits {
                wall_time_limit: wall_time,
                max_output: output,
            };

            let result = base.with_overrides(&ResourceLimits::unset());
            prop_assert_eq!(result.wall_time_limit, base.wall_time_limit);
            prop_assert_eq!(result.max_output, base.max_output);
        }

        #[test]
        fn with_overrides_full_override(
            base_time in proptest::option::of(0.0f64..1000.0),
            override_time in 0.0f64..1000.0,
        ) {
            let base = ResourceLimits {
                wall_time_limit: base_time,
                ..Default::default()
            };
            let overrides = ResourceLimits::unset().with_wall_time_limit(override_time);

            let result = base.with_overrides(&overrides);
            prop_assert_eq!(result.wall_time_limit, Some(override_time));
        }

        #[test]
        fn exactly_one_of_output_and_error(text in ".*", ms in 0u64..100_000, ok in any::<bool>()) {
            let result = if ok {
                ExecutionResult::success(text, ms)
            } else {
                ExecutionResult::failure(text, ms)
            };
            prop_assert!(result.output.is_some() != result.error.is_some());
            prop_assert_eq!(result.output.is_some(), result.success);
        }
    }
}

//! Configuration file loading for codejudge
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::config::{BackendKind, Config, ConfigError, ENV_PREFIX};
use crate::types::ResourceLimits;

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        Self::finish(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        Self::finish(config)
    }

    /// Load configuration from `path` (or the embedded example when `None`),
    /// then apply `CODEJUDGE__*` environment overrides.
    ///
    /// Nested keys use `__` as separator, e.g. `CODEJUDGE__JUDGE0__API_KEY`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder();
        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::from_str(
                crate::config::EXAMPLE_CONFIG,
                FileFormat::Toml,
            )),
        };
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(config)
    }

    fn finish(config: ConfigBuilder) -> Result<Self, ConfigError> {
        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        validate_base_limits("compile_limits", &self.compile_limits)?;
        validate_base_limits("default_limits", &self.default_limits)?;

        if self.backend == BackendKind::Judge0 {
            match self.judge0 {
                Some(ref judge0) if !judge0.url.is_empty() => {}
                _ => {
                    return Err(ConfigError::Invalid(
                        "backend 'judge0' requires a [judge0] section with a url".to_owned(),
                    ));
                }
            }
        }

        // Validate all languages have required fields
        for (id, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty extension"
                )));
            }
            if lang.run.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty run command"
                )));
            }
            if let Some(ref limits) = lang.run.limits {
                validate_limits(&format!("languages.{id}.run.limits"), limits)?;
            }
            if let Some(ref compile) = lang.compile {
                if compile.command.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has empty compile command"
                    )));
                }
                if compile.source_name.is_empty() || compile.output_name.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' needs both source_name and output_name"
                    )));
                }
                if let Some(ref limits) = compile.limits {
                    validate_limits(&format!("languages.{id}.compile.limits"), limits)?;
                }
            }
        }

        Ok(())
    }
}

/// Base tables are the last layer, so they must always carry a deadline
fn validate_base_limits(section: &str, limits: &ResourceLimits) -> Result<(), ConfigError> {
    if limits.wall_time_limit.is_none() {
        return Err(ConfigError::Invalid(format!(
            "{section}.wall_time_limit is required"
        )));
    }
    validate_limits(section, limits)
}

fn validate_limits(section: &str, limits: &ResourceLimits) -> Result<(), ConfigError> {
    if let Some(secs) = limits.wall_time_limit
        && !ResourceLimits::is_valid_wall_time(secs)
    {
        return Err(ConfigError::Invalid(format!(
            "{section}.wall_time_limit must be a positive number of seconds"
        )));
    }
    Ok(())
}

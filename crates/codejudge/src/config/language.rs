use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;
use crate::types::ResourceLimits;

const INVALID_FILE_EXT_CHARS: [char; 2] = ['/', '.'];

/// Command template placeholders
pub const SOURCE_PLACEHOLDER: &str = "{source}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";
pub const BINARY_PLACEHOLDER: &str = "{binary}";

/// Configuration for a programming language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name for the language (e.g., "C++ (GCC)")
    pub name: String,

    /// File extension
    pub extension: FileExtension,

    /// Language id understood by a remote Judge0 instance
    #[serde(default)]
    pub judge0_id: Option<u32>,

    /// Compilation configuration (None for interpreted languages)
    #[serde(default)]
    pub compile: Option<CompileConfig>,

    /// Execution configuration
    pub run: RunConfig,
}

impl Language {
    /// Check if the language is compiled
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Get the source file name for this language
    pub fn source_name(&self) -> String {
        if let Some(ref compile) = self.compile {
            compile.source_name.clone()
        } else {
            format!("main.{}", self.extension)
        }
    }

    /// Name of the artifact the compile step leaves in the workspace
    pub fn artifact_name(&self) -> Option<&str> {
        self.compile.as_ref().map(|c| c.output_name.as_str())
    }

    /// Expand placeholders in the given command
    pub fn expand_command(command: &[String], source: &str, binary: &str) -> Vec<String> {
        command
            .iter()
            .map(|arg| {
                arg.replace(SOURCE_PLACEHOLDER, source)
                    .replace(OUTPUT_PLACEHOLDER, binary)
                    .replace(BINARY_PLACEHOLDER, binary)
            })
            .collect()
    }
}

/// File extension without dot (e.g., "cpp")
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        let contains_invalid = extension
            .chars()
            .any(|c| INVALID_FILE_EXT_CHARS.contains(&c));
        if contains_invalid {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileExtension::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a file extension without '/' or '.' characters",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for the compilation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}, {output}
    pub command: Vec<String>,

    /// Source file name in the workspace (e.g., "main.cpp")
    pub source_name: String,

    /// Artifact the compiler leaves in the workspace (e.g., "main", "Main.class")
    pub output_name: String,

    /// Environment variables to set during compilation
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Resource limits for compilation (overrides defaults)
    #[serde(default)]
    pub limits: Option<ResourceLimits>,
}

/// Default PATH for spawned compilers and programs
pub const DEFAULT_SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Configuration for the execution step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}, {binary}
    pub command: Vec<String>,

    /// Environment Variables to set
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// PATH environment variable for compile and run processes
    ///
    /// Defaults to "/usr/local/bin:/usr/bin:/bin" if not specified.
    #[serde(default = "default_sandbox_path")]
    pub path: String,

    /// Resource limits for execution (overrides defaults)
    #[serde(default)]
    pub limits: Option<ResourceLimits>,
}

fn default_sandbox_path() -> String {
    DEFAULT_SANDBOX_PATH.to_owned()
}

//! Execution backends
//!
//! The surfaces (CLI, HTTP) talk to an [`ExecutionBackend`] and never to the
//! pipeline directly. [`LocalBackend`] compiles and runs on this host;
//! [`Judge0Backend`] forwards submissions to a remote Judge0 API. Which one is
//! used is decided by `backend` in the configuration.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use crate::backend::judge0::{Judge0Backend, Judge0Error};
pub use crate::backend::local::LocalBackend;

mod judge0;
mod local;

use crate::config::{BackendKind, Config, ConfigError};
use crate::registry::LanguageRegistry;
use crate::runner::Runner;
use crate::types::{ExecutionRequest, ExecutionResult};
use crate::verdict::Judgement;

/// Something that can judge submissions
#[async_trait]
pub trait ExecutionBackend: Send + Sync + fmt::Debug {
    /// Short name for logs ("local", "judge0")
    fn name(&self) -> &'static str;

    /// Languages this backend accepts
    fn registry(&self) -> &LanguageRegistry;

    /// Judge one submission; every outcome is a verdict
    async fn judge(&self, request: ExecutionRequest) -> Judgement;

    /// Judge one submission and format the caller-facing result
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        self.judge(request).await.to_result()
    }
}

/// Build the backend selected by the configuration
pub fn from_config(config: &Config) -> Result<Arc<dyn ExecutionBackend>, ConfigError> {
    match config.backend {
        BackendKind::Local => Ok(Arc::new(LocalBackend::new(Runner::new(config)))),
        BackendKind::Judge0 => {
            let judge0 = config.judge0.clone().ok_or_else(|| {
                ConfigError::Invalid("backend 'judge0' requires a [judge0] section".to_owned())
            })?;
            let backend = Judge0Backend::new(judge0, LanguageRegistry::from_config(config))
                .map_err(|e| ConfigError::Invalid(format!("cannot build judge0 client: {e}")))?;
            Ok(Arc::new(backend))
        }
    }
}
